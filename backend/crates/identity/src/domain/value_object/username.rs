//! Username Value Object
//!
//! The username is the public handle an identity logs in and is displayed
//! with. It is stored in exactly one form: NFKC-normalized, validated,
//! then lowercased. The lowercase form is the uniqueness domain enforced
//! by storage.
//!
//! ## Invariants
//! - Length: 3-30 characters (after normalization)
//! - Charset: ASCII alphanumerics plus `_ . - +`
//! - First and last character: alphanumeric or `_`
//! - No consecutive dots (`..`)
//! - At least one alphanumeric character
//! - Not on the reserved-word list

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use kernel::error::app_error::{AppError, AppResult};

// ============================================================================
// Constants
// ============================================================================

/// Minimum length for a username (in characters)
pub const USERNAME_MIN_LENGTH: usize = 3;

/// Maximum length for a username (in characters)
pub const USERNAME_MAX_LENGTH: usize = 30;

/// Allowed special characters in a username
const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-', '+'];

/// Reserved words that cannot be used as usernames.
///
/// Kept to names that collide with routing or operational identities.
const RESERVED_WORDS: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "support",
    "api",
    "auth",
    "login",
    "logout",
    "register",
    "password",
    "reset",
    "me",
    "anonymous",
    "null",
];

// ============================================================================
// Username
// ============================================================================

/// Username value object (canonical lowercase form)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create a new username with validation
    ///
    /// Processing order: NFKC normalization, validation, lowercasing.
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let normalized: String = raw.as_ref().trim().nfkc().collect();

        let char_count = normalized.chars().count();
        if char_count < USERNAME_MIN_LENGTH {
            return Err(AppError::bad_request(format!(
                "Username must be at least {} characters",
                USERNAME_MIN_LENGTH
            )));
        }
        if char_count > USERNAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Username must be at most {} characters",
                USERNAME_MAX_LENGTH
            )));
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&c))
        {
            return Err(AppError::bad_request(
                "Username may only contain letters, digits, and _ . - +",
            ));
        }

        if !normalized.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::bad_request(
                "Username must contain at least one letter or digit",
            ));
        }

        let first = normalized.chars().next().unwrap_or(' ');
        let last = normalized.chars().last().unwrap_or(' ');
        if !(first.is_ascii_alphanumeric() || first == '_')
            || !(last.is_ascii_alphanumeric() || last == '_')
        {
            return Err(AppError::bad_request(
                "Username must start and end with a letter, digit, or _",
            ));
        }

        if normalized.contains("..") {
            return Err(AppError::bad_request(
                "Username must not contain consecutive dots",
            ));
        }

        let canonical = normalized.to_lowercase();

        if RESERVED_WORDS.contains(&canonical.as_str()) {
            return Err(AppError::bad_request("This username is reserved")
                .with_action("Please choose a different username"));
        }

        Ok(Self(canonical))
    }

    /// Create from database value (assumed already canonical)
    pub fn from_db(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    /// Get the canonical (lowercase) username
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(Username::new("alice").is_ok());
        assert!(Username::new("alice.b").is_ok());
        assert!(Username::new("a_b-c+d").is_ok());
        assert!(Username::new("abc").is_ok());
        assert!(Username::new("a".repeat(USERNAME_MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_lowercasing() {
        let username = Username::new("Alice").unwrap();
        assert_eq!(username.as_str(), "alice");

        let a = Username::new("ALICE").unwrap();
        let b = Username::new("alice").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_length_limits() {
        assert!(Username::new("ab").is_err());
        assert!(Username::new("a".repeat(USERNAME_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_invalid_characters() {
        assert!(Username::new("ali ce").is_err());
        assert!(Username::new("alice!").is_err());
        assert!(Username::new("日本語ユーザー").is_err());
    }

    #[test]
    fn test_edge_characters() {
        assert!(Username::new(".alice").is_err());
        assert!(Username::new("alice.").is_err());
        assert!(Username::new("-alice").is_err());
        assert!(Username::new("_alice").is_ok());
        assert!(Username::new("ali..ce").is_err());
        assert!(Username::new("...").is_err()); // no alphanumeric
    }

    #[test]
    fn test_reserved_words() {
        assert!(Username::new("admin").is_err());
        assert!(Username::new("Admin").is_err()); // reserved check is on lowercase
        assert!(Username::new("root").is_err());
        assert!(Username::new("administrator2").is_ok()); // exact match only
    }

    #[test]
    fn test_nfkc_normalization() {
        // Full-width characters normalize to ASCII before validation
        let username = Username::new("ａｌｉｃｅ").unwrap();
        assert_eq!(username.as_str(), "alice");
    }
}
