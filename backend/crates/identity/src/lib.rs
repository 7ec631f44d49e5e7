//! Identity - Credential & Session Lifecycle
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, services, port traits
//! - `application/` - Use cases (the contract the boundary layer consumes)
//! - `infra/` - Repository and mail-transport implementations
//!
//! ## Features
//! - Registration and login with username-or-email + password
//! - Signed access/refresh token pairs (separate secrets and TTLs)
//! - Refresh-token rotation with reuse detection (single active session)
//! - Password change and one-time-code password reset over email
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Tokens are HMAC-SHA256 signed claims; verification precedes decoding
//! - Exactly one redeemable refresh token per identity, replaced by an
//!   atomic compare-and-swap on every rotation
//! - Every expected failure is a typed `AuthError` variant

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::memory::InMemoryIdentityRepository;
pub use infra::postgres::PgIdentityRepository;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::identity::*;
    pub use crate::domain::value_object::email::Email;
    pub use crate::domain::value_object::identity_id::IdentityId;
    pub use crate::domain::value_object::public_id::PublicId;
    pub use crate::domain::value_object::reset_code::ResetCode;
    pub use crate::domain::value_object::user_password::{PasswordDigest, RawPassword};
    pub use crate::domain::value_object::username::Username;
}

pub mod use_cases {
    pub use crate::application::authenticate::AuthenticateUseCase;
    pub use crate::application::change_password::ChangePasswordUseCase;
    pub use crate::application::forgot_password::ForgotPasswordUseCase;
    pub use crate::application::login::{LoginOutput, LoginUseCase};
    pub use crate::application::logout::LogoutUseCase;
    pub use crate::application::refresh_session::RefreshSessionUseCase;
    pub use crate::application::register::{RegisterInput, RegisterUseCase};
    pub use crate::application::reset_password::ResetPasswordUseCase;
    pub use crate::application::update_account::{UpdateAccountInput, UpdateAccountUseCase};
}

pub mod services {
    pub use crate::domain::service::session_ledger::{SessionLedger, TokenPair};
    pub use crate::domain::service::token_issuer::{TokenClaims, TokenIssuer, TokenKind};
}

pub mod ports {
    pub use crate::domain::mailer::Mailer;
    pub use crate::domain::repository::IdentityRepository;
}
