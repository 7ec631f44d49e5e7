//! Identity Error Types
//!
//! This module provides identity-specific error variants that integrate
//! with the unified `kernel::error` classification.
//!
//! Every expected failure of the credential lifecycle has its own variant;
//! unstructured errors are reserved for programmer/configuration faults
//! (`Internal`) and storage faults (`Database`).

use kernel::error::kind::ErrorKind;
use thiserror::Error;

/// Identity-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Identity-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (unknown identity is reported separately)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No identity matches the given identifier
    #[error("Identity not found")]
    IdentityNotFound,

    /// Username or email is already registered
    #[error("Identity already exists")]
    AlreadyExists,

    /// Token failed signature, decoding, or expiry checks
    #[error("Invalid or expired token")]
    InvalidToken,

    /// A refresh token was presented that is no longer the active one.
    /// Stronger than `InvalidToken`: the boundary layer must clear any
    /// session state it holds for this client.
    #[error("Refresh token has already been rotated or revoked")]
    RefreshTokenReuseDetected,

    /// Reset code unknown, consumed, or past its expiry
    #[error("Invalid or expired reset code")]
    InvalidOrExpiredCode,

    /// Old password did not verify during a password change
    #[error("Invalid old password")]
    InvalidOldPassword,

    /// The email transport did not accept the message
    #[error("Failed to deliver email")]
    DeliveryFailed,

    /// Input failed domain validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error (hashing/signing/config faults, never caller input)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::RefreshTokenReuseDetected => ErrorKind::Unauthorized,
            AuthError::IdentityNotFound => ErrorKind::NotFound,
            AuthError::AlreadyExists => ErrorKind::Conflict,
            AuthError::InvalidOrExpiredCode | AuthError::InvalidOldPassword => {
                ErrorKind::BadRequest
            }
            AuthError::DeliveryFailed => ErrorKind::ServiceUnavailable,
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    ///
    /// Messages never include password digests, signing secrets, or
    /// stored reset codes.
    pub fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Identity database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Identity internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RefreshTokenReuseDetected => {
                tracing::warn!("Refresh token reuse detected");
            }
            _ => {
                tracing::debug!(error = %self, "Identity error");
            }
        }
    }
}

impl From<kernel::error::app_error::AppError> for AuthError {
    fn from(err: kernel::error::app_error::AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
