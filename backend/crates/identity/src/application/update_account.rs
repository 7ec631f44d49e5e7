//! Update Account Use Case
//!
//! Updates profile fields (display name, email). Credential state is
//! untouched; an email change re-enters the uniqueness domain.

use std::sync::Arc;

use crate::domain::entity::identity::PublicIdentity;
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{email::Email, identity_id::IdentityId};
use crate::error::{AuthError, AuthResult};

/// Update account input; `None` fields are left unchanged
#[derive(Default)]
pub struct UpdateAccountInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Update account use case
pub struct UpdateAccountUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
}

impl<R> UpdateAccountUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        identity_id: &IdentityId,
        input: UpdateAccountInput,
    ) -> AuthResult<PublicIdentity> {
        let mut identity = self
            .repo
            .find_by_id(identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if let Some(full_name) = input.full_name {
            let full_name = full_name.trim().to_string();
            if full_name.is_empty() {
                return Err(AuthError::Validation("Full name is required".to_string()));
            }
            identity.set_full_name(full_name);
        }

        if let Some(email) = input.email {
            let email = Email::new(email)
                .map_err(|e| AuthError::Validation(e.message().to_string()))?;

            if email != identity.email {
                if self.repo.exists_by_email(&email).await? {
                    return Err(AuthError::AlreadyExists);
                }
                identity.set_email(email);
            }
        }

        self.repo.update(&identity).await?;

        tracing::info!(public_id = %identity.public_id, "Account details updated");

        Ok(identity.to_public())
    }
}
