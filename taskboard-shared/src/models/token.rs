/// Stored bearer-token session records
///
/// Every successful registration, login, or refresh persists the issued
/// access token here. A record is *live* while both `expired` and
/// `revoked` are false; issuing a new token first flips both flags on all
/// of the user's live records, so at most one live token exists per user
/// at any time (single active session).
///
/// Validity of a presented token is decided in two places: this record
/// must be live, and the embedded JWT must pass the checks in
/// [`crate::auth::jwt`]. Neither alone is sufficient.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE token_type AS ENUM ('bearer');
///
/// CREATE TABLE tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token TEXT NOT NULL UNIQUE,
///     token_type token_type NOT NULL DEFAULT 'bearer',
///     expired BOOLEAN NOT NULL DEFAULT FALSE,
///     revoked BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Storage classification of a token record
///
/// Access and refresh tokens are distinguished by their embedded claims;
/// in storage both are plain bearer credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_type", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    /// Bearer credential presented in the Authorization header
    Bearer,
}

/// A persisted token record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    /// Unique record ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// The signed token string exactly as issued
    pub token: String,

    /// Storage classification (always bearer)
    pub token_type: TokenType,

    /// Set when a newer token superseded this one
    pub expired: bool,

    /// Set when this token was revoked server-side
    pub revoked: bool,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Whether this record still authenticates requests
    pub fn is_live(&self) -> bool {
        !self.expired && !self.revoked
    }

    /// Persists a freshly issued token as a live session record
    pub async fn save(pool: &PgPool, user_id: Uuid, token: &str) -> Result<Self, sqlx::Error> {
        let record = sqlx::query_as::<_, Token>(
            r#"
            INSERT INTO tokens (user_id, token, token_type, expired, revoked)
            VALUES ($1, $2, 'bearer', FALSE, FALSE)
            RETURNING id, user_id, token, token_type, expired, revoked, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Looks up a record by the exact token string
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, Token>(
            r#"
            SELECT id, user_id, token, token_type, expired, revoked, created_at
            FROM tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Lists a user's live token records
    ///
    /// With the revocation discipline in [`Token::revoke_all_for_user`]
    /// this returns at most one record, but the query does not assume it.
    pub async fn find_all_valid_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, Token>(
            r#"
            SELECT id, user_id, token, token_type, expired, revoked, created_at
            FROM tokens
            WHERE user_id = $1 AND NOT expired AND NOT revoked
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Revokes and expires all of a user's live tokens
    ///
    /// Runs as a single UPDATE so the store's per-row write serialization
    /// keeps the one-live-token invariant under concurrent issuance.
    /// Returns the number of records invalidated.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET expired = TRUE, revoked = TRUE
            WHERE user_id = $1 AND NOT expired AND NOT revoked
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
