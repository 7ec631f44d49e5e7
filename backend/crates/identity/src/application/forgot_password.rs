//! Forgot Password Use Case
//!
//! Issues a one-time reset code and emails it to the registered address.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::identity::Identity;
use crate::domain::mailer::Mailer;
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{email::Email, reset_code::ResetCode};
use crate::error::{AuthError, AuthResult};

/// Subject line of the reset email
const RESET_EMAIL_SUBJECT: &str = "Reset Password";

/// Forgot password use case
pub struct ForgotPasswordUseCase<R, M>
where
    R: IdentityRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<R, M> ForgotPasswordUseCase<R, M>
where
    R: IdentityRepository,
    M: Mailer,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            mailer,
            config,
        }
    }

    /// Issue a fresh reset code for the identity registered under `email`
    ///
    /// Any pending code is replaced (last-writer-wins; at most one valid
    /// code exists at a time). The code is persisted before the email is
    /// handed to the transport: a failed send surfaces `DeliveryFailed`
    /// but never discards the stored code.
    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let mut identity = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let code = ResetCode::generate();
        let window = chrono::Duration::from_std(self.config.reset_code_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid reset-code TTL: {e}")))?;

        identity.begin_reset(code.clone(), window);
        self.repo.update(&identity).await?;

        let html = self.reset_email_html(&identity, &code);
        let delivered = self
            .mailer
            .send(&identity.email, RESET_EMAIL_SUBJECT, &html)
            .await;

        if !delivered {
            tracing::warn!(
                public_id = %identity.public_id,
                "Reset email delivery failed; stored code remains valid"
            );
            return Err(AuthError::DeliveryFailed);
        }

        tracing::info!(public_id = %identity.public_id, "Password reset code issued");

        Ok(())
    }

    fn reset_email_html(&self, identity: &Identity, code: &ResetCode) -> String {
        let reset_link = format!("{}/reset-password/{}", self.config.frontend_url, code);
        let minutes = self.config.reset_code_ttl_minutes();

        format!(
            "<!DOCTYPE html>\
             <html lang=\"en\">\
             <body>\
             <h1>{service}</h1>\
             <p>Hi {name},</p>\
             <p>You requested a password reset for your {service} account.</p>\
             <p>Your one-time code is <strong>{code}</strong>. \
             It is valid for <strong>{minutes} minutes</strong>.</p>\
             <p><a href=\"{link}\">Reset Password</a></p>\
             <p>If you didn't ask to reset your password, you can safely ignore this email.</p>\
             </body>\
             </html>",
            service = self.config.service_name,
            name = identity.full_name,
            code = code,
            minutes = minutes,
            link = reset_link,
        )
    }
}
