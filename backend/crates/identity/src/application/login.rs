//! Login Use Case
//!
//! Authenticates an identity and issues a token pair.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::identity::{Identity, PublicIdentity};
use crate::domain::repository::IdentityRepository;
use crate::domain::service::session_ledger::{SessionLedger, TokenPair};
use crate::domain::value_object::{email::Email, user_password::RawPassword, username::Username};
use crate::error::{AuthError, AuthResult};

/// Login output
pub struct LoginOutput {
    /// The authenticated identity, secrets excluded
    pub identity: PublicIdentity,
    /// Freshly issued token pair
    pub tokens: TokenPair,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    ledger: SessionLedger<R>,
}

impl<R> LoginUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let ledger = SessionLedger::new(repo.clone(), config.token_issuer());
        Self { repo, ledger }
    }

    /// Authenticate by username or email plus password
    pub async fn execute(&self, identifier: &str, password: &str) -> AuthResult<LoginOutput> {
        let identity = self.find_by_identifier(identifier).await?;
        let mut identity = identity.ok_or(AuthError::IdentityNotFound)?;

        // Password policy failures count as a wrong password here; the
        // stored digest could never match such input anyway
        let raw_password = RawPassword::new(password.to_string())
            .map_err(|_| AuthError::InvalidCredentials)?;

        if !identity.password_digest.verify(&raw_password) {
            tracing::warn!(public_id = %identity.public_id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        identity.record_login();
        self.repo.update(&identity).await?;

        let tokens = self.ledger.issue(&identity).await?;

        tracing::info!(
            public_id = %identity.public_id,
            username = %identity.username,
            "Identity logged in"
        );

        Ok(LoginOutput {
            identity: identity.to_public(),
            tokens,
        })
    }

    /// Dispatch identifier to the right lookup
    async fn find_by_identifier(&self, identifier: &str) -> AuthResult<Option<Identity>> {
        if identifier.contains('@') {
            // Looks like email
            let Ok(email) = Email::new(identifier) else {
                return Ok(None);
            };
            self.repo.find_by_email(&email).await
        } else {
            let Ok(username) = Username::new(identifier) else {
                return Ok(None);
            };
            self.repo.find_by_username(&username).await
        }
    }
}
