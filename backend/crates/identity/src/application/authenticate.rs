//! Authenticate Use Case
//!
//! Verifies an access token and resolves the identity behind it. This is
//! what the boundary layer calls for every authenticated request.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::identity::PublicIdentity;
use crate::domain::repository::IdentityRepository;
use crate::domain::service::token_issuer::{TokenIssuer, TokenKind};
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::{AuthError, AuthResult};

/// Authenticate use case
pub struct AuthenticateUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    issuer: TokenIssuer,
}

impl<R> AuthenticateUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            issuer: config.token_issuer(),
        }
    }

    /// Verify `access_token` and return the identity it names
    ///
    /// A token whose subject no longer exists is treated as invalid; a
    /// verified signature is not enough on its own.
    pub async fn execute(&self, access_token: &str) -> AuthResult<PublicIdentity> {
        let claims = self.issuer.verify(access_token, TokenKind::Access)?;

        let identity = self
            .repo
            .find_by_id(&IdentityId::from_uuid(claims.sub))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(identity.to_public())
    }
}
