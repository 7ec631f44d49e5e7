//! In-Memory Repository Implementation
//!
//! Backs local development and the scenario tests. A single mutex guards
//! the whole map, so the compare-and-swap on the refresh-token slot runs
//! under one lock acquisition - the same atomicity the SQL implementation
//! gets from its conditional UPDATE.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::domain::entity::identity::Identity;
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{
    email::Email, identity_id::IdentityId, reset_code::ResetCode, username::Username,
};
use crate::error::{AuthError, AuthResult};

/// In-memory identity repository
#[derive(Default)]
pub struct InMemoryIdentityRepository {
    identities: Mutex<HashMap<Uuid, Identity>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Identity>> {
        self.identities
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, identity: &Identity) -> AuthResult<()> {
        let mut identities = self.lock();

        // Storage-level uniqueness, same contract as the SQL constraints
        let taken = identities.values().any(|existing| {
            existing.username == identity.username || existing.email == identity.email
        });
        if taken {
            return Err(AuthError::AlreadyExists);
        }

        identities.insert(*identity.identity_id.as_uuid(), identity.clone());
        Ok(())
    }

    async fn find_by_id(&self, identity_id: &IdentityId) -> AuthResult<Option<Identity>> {
        Ok(self.lock().get(identity_id.as_uuid()).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<Identity>> {
        Ok(self
            .lock()
            .values()
            .find(|i| &i.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>> {
        Ok(self.lock().values().find(|i| &i.email == email).cloned())
    }

    async fn find_by_reset_code(&self, code: &ResetCode) -> AuthResult<Option<Identity>> {
        // ResetCode equality is constant-time
        Ok(self
            .lock()
            .values()
            .find(|i| {
                i.pending_reset
                    .as_ref()
                    .is_some_and(|pending| &pending.code == code)
            })
            .cloned())
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        Ok(self.lock().values().any(|i| &i.username == username))
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.lock().values().any(|i| &i.email == email))
    }

    async fn update(&self, identity: &Identity) -> AuthResult<()> {
        let mut identities = self.lock();
        let stored = identities
            .get_mut(identity.identity_id.as_uuid())
            .ok_or(AuthError::IdentityNotFound)?;

        // The refresh-token slot is deliberately not written here; see
        // the trait contract
        let active_refresh_token = stored.active_refresh_token.take();
        *stored = identity.clone();
        stored.active_refresh_token = active_refresh_token;

        Ok(())
    }

    async fn store_refresh_token(
        &self,
        identity_id: &IdentityId,
        token: &str,
    ) -> AuthResult<()> {
        let mut identities = self.lock();
        if let Some(stored) = identities.get_mut(identity_id.as_uuid()) {
            stored.active_refresh_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        identity_id: &IdentityId,
        expected: &str,
        new: &str,
    ) -> AuthResult<bool> {
        let mut identities = self.lock();
        let Some(stored) = identities.get_mut(identity_id.as_uuid()) else {
            return Ok(false);
        };

        // Compare and write under the same guard
        if stored.active_refresh_token.as_deref() != Some(expected) {
            return Ok(false);
        }
        stored.active_refresh_token = Some(new.to_string());
        Ok(true)
    }

    async fn clear_refresh_token(&self, identity_id: &IdentityId) -> AuthResult<()> {
        let mut identities = self.lock();
        if let Some(stored) = identities.get_mut(identity_id.as_uuid()) {
            stored.active_refresh_token = None;
        }
        Ok(())
    }
}
