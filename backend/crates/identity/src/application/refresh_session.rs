//! Refresh Session Use Case
//!
//! Redeems a refresh token for a new token pair.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::IdentityRepository;
use crate::domain::service::session_ledger::{SessionLedger, TokenPair};
use crate::error::AuthResult;

/// Refresh session use case
///
/// Thin pass-through to the session ledger's rotation. A
/// `RefreshTokenReuseDetected` failure must reach the boundary layer
/// unchanged so it can clear client-side session state.
pub struct RefreshSessionUseCase<R>
where
    R: IdentityRepository,
{
    ledger: SessionLedger<R>,
}

impl<R> RefreshSessionUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            ledger: SessionLedger::new(repo, config.token_issuer()),
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        self.ledger.rotate(refresh_token).await
    }
}
