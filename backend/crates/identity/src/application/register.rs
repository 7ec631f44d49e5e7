//! Register Use Case
//!
//! Creates a new identity.

use std::sync::Arc;

use crate::domain::entity::identity::{Identity, PublicIdentity};
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{
    email::Email, user_password::{PasswordDigest, RawPassword}, username::Username,
};
use crate::error::{AuthError, AuthResult};

/// Maximum display-name length
const FULL_NAME_MAX_LENGTH: usize = 100;

/// Register input
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// Register use case
pub struct RegisterUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
}

impl<R> RegisterUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<PublicIdentity> {
        let username = Username::new(&input.username)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let email = Email::new(&input.email)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let full_name = input.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(AuthError::Validation("Full name is required".to_string()));
        }
        if full_name.chars().count() > FULL_NAME_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "Full name must be at most {} characters",
                FULL_NAME_MAX_LENGTH
            )));
        }

        // Uniqueness first: hashing is expensive, so confirm the account
        // can exist before paying for it
        if self.repo.exists_by_username(&username).await? {
            return Err(AuthError::AlreadyExists);
        }
        if self.repo.exists_by_email(&email).await? {
            return Err(AuthError::AlreadyExists);
        }

        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let password_digest = PasswordDigest::from_raw(&raw_password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let identity = Identity::new(username, email, full_name, password_digest);

        // Storage enforces uniqueness too; a lost race surfaces as
        // AlreadyExists from create
        self.repo.create(&identity).await?;

        tracing::info!(
            public_id = %identity.public_id,
            username = %identity.username,
            "Identity registered"
        );

        Ok(identity.to_public())
    }
}
