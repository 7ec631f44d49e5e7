//! Application Configuration
//!
//! Configuration for the identity application layer. Built once at
//! process start and passed by reference into the use cases - secrets are
//! never re-read from the environment at call time.

use std::time::Duration;

use crate::domain::service::token_issuer::TokenIssuer;

/// Identity application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access-token secret key for HMAC signing (32 bytes)
    pub access_token_secret: [u8; 32],
    /// Refresh-token secret key for HMAC signing (32 bytes)
    pub refresh_token_secret: [u8; 32],
    /// Access token TTL (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token TTL (7 days)
    pub refresh_token_ttl: Duration,
    /// Password-reset code validity window (15 minutes)
    pub reset_code_ttl: Duration,
    /// Base URL the reset link in the email points at
    pub frontend_url: String,
    /// Service name shown in outbound email
    pub service_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: [0u8; 32],
            refresh_token_secret: [0u8; 32],
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            reset_code_ttl: Duration::from_secs(15 * 60),
            frontend_url: "http://localhost:3000".to_string(),
            service_name: "Sentinel IAM".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create config with random token secrets (for development)
    pub fn with_random_secrets() -> Self {
        use rand::RngCore;
        let mut access_secret = [0u8; 32];
        let mut refresh_secret = [0u8; 32];
        rand::rng().fill_bytes(&mut access_secret);
        rand::rng().fill_bytes(&mut refresh_secret);
        Self {
            access_token_secret: access_secret,
            refresh_token_secret: refresh_secret,
            ..Default::default()
        }
    }

    /// Build the token issuer for these secrets and TTLs
    pub fn token_issuer(&self) -> TokenIssuer {
        TokenIssuer::new(
            self.access_token_secret,
            self.refresh_token_secret,
            self.access_token_ttl,
            self.refresh_token_ttl,
        )
    }

    /// Reset-code validity window in whole minutes (for email copy)
    pub fn reset_code_ttl_minutes(&self) -> u64 {
        self.reset_code_ttl.as_secs() / 60
    }
}
