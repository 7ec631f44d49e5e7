//! Change Password Use Case
//!
//! Replaces the password after verifying the old one. The active session
//! is revoked, forcing re-login.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::IdentityRepository;
use crate::domain::service::session_ledger::SessionLedger;
use crate::domain::value_object::identity_id::IdentityId;
use crate::domain::value_object::user_password::{PasswordDigest, RawPassword};
use crate::error::{AuthError, AuthResult};

/// Change password use case
pub struct ChangePasswordUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    ledger: SessionLedger<R>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let ledger = SessionLedger::new(repo.clone(), config.token_issuer());
        Self { repo, ledger }
    }

    pub async fn execute(
        &self,
        identity_id: &IdentityId,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let mut identity = self
            .repo
            .find_by_id(identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let old_raw = RawPassword::new(old_password.to_string())
            .map_err(|_| AuthError::InvalidOldPassword)?;
        if !identity.password_digest.verify(&old_raw) {
            return Err(AuthError::InvalidOldPassword);
        }

        let new_raw = RawPassword::new(new_password.to_string())
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let new_digest = PasswordDigest::from_raw(&new_raw)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        identity.set_password(new_digest);
        self.repo.update(&identity).await?;

        // Force re-login everywhere
        self.ledger.revoke(identity_id).await?;

        tracing::info!(
            public_id = %identity.public_id,
            "Password changed, session revoked"
        );

        Ok(())
    }
}
