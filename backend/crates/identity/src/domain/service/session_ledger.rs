//! Session Ledger
//!
//! Owns the single persisted refresh-token slot per identity and
//! implements rotation with reuse detection.
//!
//! Storing exactly one active refresh token (rather than a token list)
//! makes reuse trivially detectable: any second presentation of an
//! already-rotated token is, by construction, no longer the stored value.
//! The trade-off is a single active session per identity.

use std::sync::Arc;

use crate::domain::entity::identity::Identity;
use crate::domain::repository::IdentityRepository;
use crate::domain::service::token_issuer::{TokenIssuer, TokenKind};
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::{AuthError, AuthResult};

/// A freshly minted access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh-token slot owner
#[derive(Clone)]
pub struct SessionLedger<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    issuer: TokenIssuer,
}

impl<R> SessionLedger<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, issuer: TokenIssuer) -> Self {
        Self { repo, issuer }
    }

    /// Mint a new token pair and make its refresh token the sole active one
    ///
    /// This is the only way a refresh token becomes active. Any previously
    /// stored token is overwritten and thereby invalidated.
    pub async fn issue(&self, identity: &Identity) -> AuthResult<TokenPair> {
        let access_token = self.issuer.issue_access_token(identity)?;
        let refresh_token = self.issuer.issue_refresh_token(identity)?;

        self.repo
            .store_refresh_token(&identity.identity_id, &refresh_token)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Redeem a refresh token for a new pair
    ///
    /// The stored slot is replaced with the new refresh token in one
    /// atomic compare-and-swap; of two concurrent rotations with the same
    /// token, exactly one can win. The loser - and any later presentation
    /// of the consumed token - gets `RefreshTokenReuseDetected`, on which
    /// the caller must clear whatever session state it holds.
    pub async fn rotate(&self, presented: &str) -> AuthResult<TokenPair> {
        let claims = self.issuer.verify(presented, TokenKind::Refresh)?;

        let identity = self
            .repo
            .find_by_id(&IdentityId::from_uuid(claims.sub))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        // Cheap pre-check; the CAS below is what actually decides
        match identity.active_refresh_token.as_deref() {
            Some(active) if active == presented => {}
            _ => {
                tracing::warn!(
                    public_id = %identity.public_id,
                    "Refresh token reuse detected"
                );
                return Err(AuthError::RefreshTokenReuseDetected);
            }
        }

        let access_token = self.issuer.issue_access_token(&identity)?;
        let refresh_token = self.issuer.issue_refresh_token(&identity)?;

        let swapped = self
            .repo
            .swap_refresh_token(&identity.identity_id, presented, &refresh_token)
            .await?;

        if !swapped {
            tracing::warn!(
                public_id = %identity.public_id,
                "Refresh token rotated concurrently, rejecting"
            );
            return Err(AuthError::RefreshTokenReuseDetected);
        }

        tracing::debug!(public_id = %identity.public_id, "Refresh token rotated");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Clear the refresh-token slot; idempotent
    ///
    /// Used by logout and password change.
    pub async fn revoke(&self, identity_id: &IdentityId) -> AuthResult<()> {
        self.repo.clear_refresh_token(identity_id).await
    }
}
