//! Logout Use Case
//!
//! Revokes the active session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::IdentityRepository;
use crate::domain::service::session_ledger::SessionLedger;
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::AuthResult;

/// Logout use case
pub struct LogoutUseCase<R>
where
    R: IdentityRepository,
{
    ledger: SessionLedger<R>,
}

impl<R> LogoutUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            ledger: SessionLedger::new(repo, config.token_issuer()),
        }
    }

    /// Clear the identity's refresh-token slot; idempotent
    pub async fn execute(&self, identity_id: &IdentityId) -> AuthResult<()> {
        self.ledger.revoke(identity_id).await?;
        tracing::info!(identity_id = %identity_id, "Identity logged out");
        Ok(())
    }
}
