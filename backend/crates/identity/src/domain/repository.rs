//! Repository Trait
//!
//! Interface for identity persistence. Implementations are in the
//! infrastructure layer.
//!
//! The refresh-token slot has its own three methods (`store`, `swap`,
//! `clear`) and is deliberately NOT written by `update`: every slot
//! mutation goes through the session ledger, and the swap is the atomic
//! compare-and-swap that rotation correctness depends on.

use crate::domain::entity::identity::Identity;
use crate::domain::value_object::{
    email::Email, identity_id::IdentityId, reset_code::ResetCode, username::Username,
};
use crate::error::AuthResult;

/// Identity repository trait
#[trait_variant::make(IdentityRepository: Send)]
pub trait LocalIdentityRepository {
    /// Create a new identity
    ///
    /// Username and email uniqueness is enforced by storage; a violation
    /// surfaces as `AuthError::AlreadyExists`.
    async fn create(&self, identity: &Identity) -> AuthResult<()>;

    /// Find identity by internal ID
    async fn find_by_id(&self, identity_id: &IdentityId) -> AuthResult<Option<Identity>>;

    /// Find identity by username
    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<Identity>>;

    /// Find identity by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>>;

    /// Find the identity holding exactly this pending reset code
    async fn find_by_reset_code(&self, code: &ResetCode) -> AuthResult<Option<Identity>>;

    /// Check if a username exists
    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool>;

    /// Check if an email exists
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Update profile and credential fields
    ///
    /// Persists everything EXCEPT the refresh-token slot.
    async fn update(&self, identity: &Identity) -> AuthResult<()>;

    /// Unconditionally set the refresh-token slot
    async fn store_refresh_token(&self, identity_id: &IdentityId, token: &str) -> AuthResult<()>;

    /// Atomically replace the refresh-token slot only if it still holds
    /// `expected`
    ///
    /// Returns `false` when the stored value no longer matches - the
    /// reuse-detection signal. Exactly one of two concurrent swaps with
    /// the same `expected` can return `true`.
    async fn swap_refresh_token(
        &self,
        identity_id: &IdentityId,
        expected: &str,
        new: &str,
    ) -> AuthResult<bool>;

    /// Clear the refresh-token slot; idempotent
    async fn clear_refresh_token(&self, identity_id: &IdentityId) -> AuthResult<()>;
}
