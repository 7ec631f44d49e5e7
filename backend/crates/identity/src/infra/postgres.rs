//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::identity::{Identity, PendingReset};
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{
    email::Email, identity_id::IdentityId, public_id::PublicId, reset_code::ResetCode,
    user_password::PasswordDigest, username::Username,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL unique-violation error code
const PG_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed identity repository
#[derive(Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Discard reset codes whose expiry has passed
    ///
    /// Expired codes are also discarded lazily on consumption; this sweep
    /// just keeps the table clean.
    pub async fn cleanup_expired_reset_codes(&self) -> AuthResult<u64> {
        let cleared = sqlx::query(
            r#"
            UPDATE identities SET
                reset_code = NULL,
                reset_code_expires_at = NULL
            WHERE reset_code_expires_at < $1
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(codes_cleared = cleared, "Cleaned up expired reset codes");

        Ok(cleared)
    }

    fn map_create_error(e: sqlx::Error) -> AuthError {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                return AuthError::AlreadyExists;
            }
        }
        AuthError::Database(e)
    }
}

const SELECT_IDENTITY: &str = r#"
    SELECT
        identity_id,
        public_id,
        username,
        email,
        full_name,
        password_digest,
        active_refresh_token,
        reset_code,
        reset_code_expires_at,
        last_login_at,
        created_at,
        updated_at
    FROM identities
"#;

impl IdentityRepository for PgIdentityRepository {
    async fn create(&self, identity: &Identity) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identities (
                identity_id,
                public_id,
                username,
                email,
                full_name,
                password_digest,
                active_refresh_token,
                reset_code,
                reset_code_expires_at,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(identity.identity_id.as_uuid())
        .bind(identity.public_id.as_str())
        .bind(identity.username.as_str())
        .bind(identity.email.as_str())
        .bind(&identity.full_name)
        .bind(identity.password_digest.as_phc_string())
        .bind(identity.active_refresh_token.as_deref())
        .bind(identity.pending_reset.as_ref().map(|r| r.code.as_str()))
        .bind(identity.pending_reset.as_ref().map(|r| r.expires_at))
        .bind(identity.last_login_at)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_create_error)?;

        Ok(())
    }

    async fn find_by_id(&self, identity_id: &IdentityId) -> AuthResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{SELECT_IDENTITY} WHERE identity_id = $1"
        ))
        .bind(identity_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_identity()).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{SELECT_IDENTITY} WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_identity()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{SELECT_IDENTITY} WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_identity()).transpose()
    }

    async fn find_by_reset_code(&self, code: &ResetCode) -> AuthResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{SELECT_IDENTITY} WHERE reset_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_identity()).transpose()
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM identities WHERE username = $1)",
        )
        .bind(username.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM identities WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, identity: &Identity) -> AuthResult<()> {
        // The refresh-token slot is deliberately not written here; see
        // the trait contract
        sqlx::query(
            r#"
            UPDATE identities SET
                username = $2,
                email = $3,
                full_name = $4,
                password_digest = $5,
                reset_code = $6,
                reset_code_expires_at = $7,
                last_login_at = $8,
                updated_at = $9
            WHERE identity_id = $1
            "#,
        )
        .bind(identity.identity_id.as_uuid())
        .bind(identity.username.as_str())
        .bind(identity.email.as_str())
        .bind(&identity.full_name)
        .bind(identity.password_digest.as_phc_string())
        .bind(identity.pending_reset.as_ref().map(|r| r.code.as_str()))
        .bind(identity.pending_reset.as_ref().map(|r| r.expires_at))
        .bind(identity.last_login_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_create_error)?;

        Ok(())
    }

    async fn store_refresh_token(
        &self,
        identity_id: &IdentityId,
        token: &str,
    ) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE identities SET
                active_refresh_token = $2,
                updated_at = $3
            WHERE identity_id = $1
            "#,
        )
        .bind(identity_id.as_uuid())
        .bind(token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        identity_id: &IdentityId,
        expected: &str,
        new: &str,
    ) -> AuthResult<bool> {
        // Single conditional UPDATE: the compare and the write are one
        // atomic statement, so concurrent rotations cannot both match
        let swapped = sqlx::query(
            r#"
            UPDATE identities SET
                active_refresh_token = $3,
                updated_at = $4
            WHERE identity_id = $1
              AND active_refresh_token IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(identity_id.as_uuid())
        .bind(expected)
        .bind(new)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(swapped == 1)
    }

    async fn clear_refresh_token(&self, identity_id: &IdentityId) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE identities SET
                active_refresh_token = NULL,
                updated_at = $2
            WHERE identity_id = $1
            "#,
        )
        .bind(identity_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct IdentityRow {
    identity_id: Uuid,
    public_id: String,
    username: String,
    email: String,
    full_name: String,
    password_digest: String,
    active_refresh_token: Option<String>,
    reset_code: Option<String>,
    reset_code_expires_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IdentityRow {
    fn into_identity(self) -> AuthResult<Identity> {
        let public_id = PublicId::parse_str(&self.public_id)?;
        let password_digest = PasswordDigest::from_phc_string(self.password_digest)?;

        // A code without an expiry (or vice versa) cannot be consumed;
        // fail closed by treating it as no pending reset
        let pending_reset = match (self.reset_code, self.reset_code_expires_at) {
            (Some(code), Some(expires_at)) => Some(PendingReset {
                code: ResetCode::from_db(code),
                expires_at,
            }),
            _ => None,
        };

        Ok(Identity {
            identity_id: IdentityId::from_uuid(self.identity_id),
            public_id,
            username: Username::from_db(self.username),
            email: Email::from_db(self.email),
            full_name: self.full_name,
            password_digest,
            active_refresh_token: self.active_refresh_token,
            pending_reset,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
