//! Token Issuer
//!
//! Signs and verifies access and refresh tokens. Stateless: everything a
//! token carries lives in its signed claims payload.
//!
//! Wire format: `base64url(json(claims)) . base64url(hmac_sha256(payload))`.
//! Each token kind has its own 32-byte secret and its own TTL, so a
//! refresh token can never verify as an access token and vice versa.
//!
//! No other module inspects raw token bytes or unverified claims:
//! verification and decoding happen here, as one step, in that order.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::entity::identity::Identity;
use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Token kind, selecting the signing secret and TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, presented on every authenticated request
    Access,
    /// Long-lived, redeemed once to mint a new token pair
    Refresh,
}

/// Signed token claims
///
/// Access tokens carry the identity profile; refresh tokens carry the
/// subject only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Internal identity UUID
    pub sub: Uuid,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub full_name: Option<String>,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Token issuance and verification service
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: [u8; 32],
    refresh_secret: [u8; 32],
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        access_secret: [u8; 32],
        refresh_secret: [u8; 32],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access token carrying the identity profile
    pub fn issue_access_token(&self, identity: &Identity) -> AuthResult<String> {
        let claims = self.claims(identity, TokenKind::Access)?;
        self.sign(&claims, TokenKind::Access)
    }

    /// Issue a refresh token carrying the subject only
    pub fn issue_refresh_token(&self, identity: &Identity) -> AuthResult<String> {
        let claims = self.claims(identity, TokenKind::Refresh)?;
        self.sign(&claims, TokenKind::Refresh)
    }

    /// Verify a token and decode its claims
    ///
    /// Fails with `InvalidToken` on bad structure, bad signature, wrong
    /// kind's secret, or expired `exp`. The payload is only decoded after
    /// the MAC verifies; unverified bytes are never trusted.
    pub fn verify(&self, token: &str, kind: TokenKind) -> AuthResult<TokenClaims> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            return Err(AuthError::InvalidToken);
        }

        let payload_b64 = parts[0];
        let signature_b64 = parts[1];

        let mut mac = HmacSha256::new_from_slice(self.secret(kind))
            .expect("HMAC can take key of any size");
        mac.update(payload_b64.as_bytes());

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::InvalidToken)?;

        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::InvalidToken)?;

        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    fn claims(&self, identity: &Identity, kind: TokenKind) -> AuthResult<TokenClaims> {
        let ttl = chrono::Duration::from_std(self.ttl(kind))
            .map_err(|e| AuthError::Internal(format!("Invalid token TTL: {e}")))?;
        let now = Utc::now();

        let claims = match kind {
            TokenKind::Access => TokenClaims {
                sub: *identity.identity_id.as_uuid(),
                username: Some(identity.username.as_str().to_string()),
                email: Some(identity.email.as_str().to_string()),
                full_name: Some(identity.full_name.clone()),
                iat: now.timestamp(),
                exp: (now + ttl).timestamp(),
            },
            TokenKind::Refresh => TokenClaims {
                sub: *identity.identity_id.as_uuid(),
                username: None,
                email: None,
                full_name: None,
                iat: now.timestamp(),
                exp: (now + ttl).timestamp(),
            },
        };

        Ok(claims)
    }

    fn sign(&self, claims: &TokenClaims, kind: TokenKind) -> AuthResult<String> {
        // A serialization failure here is a configuration/programming
        // fault, never caller input
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AuthError::Internal(format!("Token claims serialization failed: {e}")))?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(&payload);

        let mut mac = HmacSha256::new_from_slice(self.secret(kind))
            .expect("HMAC can take key of any size");
        mac.update(payload_b64.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            payload_b64,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    fn secret(&self, kind: TokenKind) -> &[u8; 32] {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}
