//! Identity Entity
//!
//! The single persisted record per registered user: profile fields plus
//! credential state (password digest, active refresh token slot, pending
//! reset code). Everything the credential lifecycle mutates lives here.
//!
//! Two explicit types cross the boundary: the full `Identity` (internal)
//! and the `PublicIdentity` projection, converted in exactly one place
//! (`Identity::to_public`). Secrets never leave through the projection.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::value_object::{
    email::Email, identity_id::IdentityId, public_id::PublicId, reset_code::ResetCode,
    user_password::PasswordDigest, username::Username,
};

/// Pending password reset
///
/// Pairs the one-time code with its expiry so an expiry can never exist
/// without a code. At most one pending reset exists per identity; issuing
/// a new one replaces it.
#[derive(Debug, Clone)]
pub struct PendingReset {
    /// One-time code sent to the registered email
    pub code: ResetCode,
    /// Instant after which the code is no longer consumable
    pub expires_at: DateTime<Utc>,
}

impl PendingReset {
    /// Check if the code is past its expiry instant
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Identity entity (full internal record)
///
/// Contains sensitive credential state; only `PublicIdentity` is handed
/// to callers outside the core.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Internal UUID identifier, immutable
    pub identity_id: IdentityId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    /// Unique login handle (canonical lowercase)
    pub username: Username,
    /// Unique registered email (canonical lowercase)
    pub email: Email,
    /// Display name
    pub full_name: String,
    /// Argon2id password digest
    pub password_digest: PasswordDigest,
    /// The sole redeemable refresh token; `None` means no active session
    pub active_refresh_token: Option<String>,
    /// Pending password reset, if any
    pub pending_reset: Option<PendingReset>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new identity
    pub fn new(
        username: Username,
        email: Email,
        full_name: String,
        password_digest: PasswordDigest,
    ) -> Self {
        let now = Utc::now();

        Self {
            identity_id: IdentityId::new(),
            public_id: PublicId::new(),
            username,
            email,
            full_name,
            password_digest,
            active_refresh_token: None,
            pending_reset: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Replace the password digest
    ///
    /// Also clears the active refresh token: a password change always
    /// forces re-login.
    pub fn set_password(&mut self, digest: PasswordDigest) {
        self.password_digest = digest;
        self.active_refresh_token = None;
        self.updated_at = Utc::now();
    }

    /// Start a password reset, replacing any pending one
    pub fn begin_reset(&mut self, code: ResetCode, window: Duration) {
        let now = Utc::now();
        self.pending_reset = Some(PendingReset {
            code,
            expires_at: now + window,
        });
        self.updated_at = now;
    }

    /// Clear the pending reset (consumed, expired, or superseded)
    pub fn clear_reset(&mut self) {
        self.pending_reset = None;
        self.updated_at = Utc::now();
    }

    /// Update the display name
    pub fn set_full_name(&mut self, full_name: String) {
        self.full_name = full_name;
        self.updated_at = Utc::now();
    }

    /// Update the registered email
    pub fn set_email(&mut self, email: Email) {
        self.email = email;
        self.updated_at = Utc::now();
    }

    /// Project to the caller-facing view, excluding all secrets
    pub fn to_public(&self) -> PublicIdentity {
        PublicIdentity {
            public_id: self.public_id,
            username: self.username.as_str().to_string(),
            email: self.email.as_str().to_string(),
            full_name: self.full_name.clone(),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        }
    }
}

/// Caller-facing identity view
///
/// Excludes the password digest, refresh token, and reset code by
/// construction rather than by per-call field stripping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    pub public_id: PublicId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
