//! Reset Code Value Object
//!
//! One-time code proving control of an identity's registered email.
//! Six decimal digits from a cryptographically secure source; single-use
//! and short-lived, which is what makes the small code space acceptable.

use std::fmt;

use rand::Rng;

use kernel::error::app_error::{AppError, AppResult};
use platform::crypto::constant_time_eq;

/// Number of digits in a reset code
pub const RESET_CODE_DIGITS: usize = 6;

/// One-time password-reset code
///
/// Equality is constant-time so code comparison never leaks a prefix
/// through timing. Deliberately not serializable; the only ways out of
/// the core are the stored column and the reset email.
#[derive(Clone)]
pub struct ResetCode(String);

impl ResetCode {
    /// Generate a fresh code from the thread CSPRNG
    ///
    /// Uniform in 100000..=999999 so the code always has exactly six
    /// digits with no leading zeros to confuse users or clients.
    pub fn generate() -> Self {
        let value: u32 = rand::rng().random_range(100_000..=999_999);
        Self(value.to_string())
    }

    /// Parse a code presented by a caller
    ///
    /// Shape check only: exactly six ASCII digits.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw.len() != RESET_CODE_DIGITS || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::bad_request("Reset code must be six digits"));
        }
        Ok(Self(raw.to_string()))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code digits
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ResetCode {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for ResetCode {}

impl fmt::Display for ResetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ResetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResetCode").field(&"[REDACTED]").finish()
    }
}
