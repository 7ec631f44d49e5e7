//! Reset Password Use Case
//!
//! Consumes a one-time reset code and sets a new password.

use std::sync::Arc;

use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::reset_code::ResetCode;
use crate::domain::value_object::user_password::{PasswordDigest, RawPassword};
use crate::error::{AuthError, AuthResult};

/// Reset password use case
pub struct ResetPasswordUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
}

impl<R> ResetPasswordUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Consume `code` and replace the password
    ///
    /// The code is single-use: it is cleared on success, and also on the
    /// first consumption attempt after its expiry. Presenting the right
    /// code is the only proof of possession - there is no lookup that
    /// reveals a stored code.
    pub async fn execute(&self, code: &str, new_password: &str) -> AuthResult<()> {
        let code = ResetCode::parse(code).map_err(|_| AuthError::InvalidOrExpiredCode)?;

        let mut identity = self
            .repo
            .find_by_reset_code(&code)
            .await?
            .ok_or(AuthError::InvalidOrExpiredCode)?;

        let Some(pending) = identity.pending_reset.as_ref() else {
            return Err(AuthError::InvalidOrExpiredCode);
        };

        if pending.is_expired() {
            // Expired codes are discarded on first touch
            identity.clear_reset();
            self.repo.update(&identity).await?;
            return Err(AuthError::InvalidOrExpiredCode);
        }

        let new_raw = RawPassword::new(new_password.to_string())
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let new_digest = PasswordDigest::from_raw(&new_raw)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        identity.set_password(new_digest);
        identity.clear_reset();
        self.repo.update(&identity).await?;

        // Force re-login everywhere
        self.repo.clear_refresh_token(&identity.identity_id).await?;

        tracing::info!(
            public_id = %identity.public_id,
            "Password reset completed, session revoked"
        );

        Ok(())
    }
}
