/// Request authentication filter
///
/// Turns a bearer token on an inbound request into an authenticated
/// identity, or, on any failure, into nothing at all. The filter is
/// fail-closed but never fail-loud: a missing header, a malformed token,
/// a revoked session, or even a store error all leave the request
/// anonymous and let it proceed, so downstream authorization denies it.
/// The failure reason is kept for diagnostics (logged at debug level) and
/// never surfaced to the caller.
///
/// A request is authenticated iff all of the following hold:
///
/// 1. The `Authorization: Bearer <token>` header is present and well-formed
/// 2. The token passes signature, expiry, and issuer checks
/// 3. The token's subject resolves to a stored user
/// 4. The stored token record exists, is neither expired nor revoked, and
///    belongs to that user
///
/// Handlers receive the identity through the [`CurrentUser`] extractor,
/// which rejects with 401 when the filter attached nothing. The
/// authentication entry points themselves are mounted outside the filter
/// (bootstrap exemption by router construction).

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{self, JwtError};
use crate::models::token::Token;
use crate::models::user::{Role, User};

/// Identity of the authenticated requester
///
/// Attached to request extensions by the filter and handed to handlers as
/// an explicit parameter; core operations never read ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID
    pub id: Uuid,

    /// Username (the token subject)
    pub username: String,

    /// Email address
    pub email: String,

    /// Role, determining the permission set
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Rejection for handlers that require an identity
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No identity was attached to the request
    #[error("Authentication required")]
    Unauthenticated,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Authentication required").into_response()
            }
        }
    }
}

/// Why a presented bearer token failed to resolve
///
/// Diagnostics only: the variants are logged, never returned to clients.
#[derive(Debug, thiserror::Error)]
enum ResolveError {
    /// Signature, expiry, or issuer check failed
    #[error("token failed validation: {0}")]
    InvalidToken(#[from] JwtError),

    /// Token subject matches no stored user
    #[error("token subject {0:?} matches no user")]
    UnknownUser(String),

    /// No session record stored for this token string
    #[error("no session record for token")]
    UnknownRecord,

    /// Session record was expired or revoked server-side
    #[error("session record is expired or revoked")]
    NotLive,

    /// Session record belongs to a different user than the subject
    #[error("session record does not belong to the token subject")]
    RecordMismatch,

    /// Store failure during resolution
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolves the request's bearer token to an identity, if any
///
/// This is the single fallible resolution step: `None` covers both the
/// anonymous case (no bearer header at all) and every failure case, with
/// failures logged at debug level.
pub async fn resolve_identity(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Option<CurrentUser> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))?;

    match try_resolve(pool, secret, token).await {
        Ok(user) => Some(user),
        Err(reason) => {
            tracing::debug!(%reason, "bearer token rejected, proceeding unauthenticated");
            None
        }
    }
}

/// The actual resolution pipeline; every step is a reason to stay anonymous
async fn try_resolve(pool: &PgPool, secret: &str, token: &str) -> Result<CurrentUser, ResolveError> {
    let username = jwt::extract_username(token, secret)?;

    let user = User::find_by_username(pool, &username)
        .await?
        .ok_or_else(|| ResolveError::UnknownUser(username.clone()))?;

    let record = Token::find_by_token(pool, token)
        .await?
        .ok_or(ResolveError::UnknownRecord)?;

    if !record.is_live() {
        return Err(ResolveError::NotLive);
    }
    if record.user_id != user.id {
        return Err(ResolveError::RecordMismatch);
    }
    if !jwt::is_token_valid(token, secret, &user.username) {
        return Err(ResolveError::NotLive);
    }

    Ok(CurrentUser::from(user))
}

/// Attaches the resolved identity to the request, at most once
///
/// An identity already present on the request is never overwritten.
pub async fn authenticate_request(pool: &PgPool, secret: &str, req: &mut Request) {
    if req.extensions().get::<CurrentUser>().is_some() {
        return;
    }

    if let Some(user) = resolve_identity(pool, secret, req.headers()).await {
        req.extensions_mut().insert(user);
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_current_user_from_user() {
        let user = test_user();
        let id = user.id;

        let current = CurrentUser::from(user);
        assert_eq!(current.id, id);
        assert_eq!(current.username, "alice");
        assert_eq!(current.role, Role::User);
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extractor_rejects_without_identity() {
        let req = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, ()) = req.into_parts();

        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_extractor_returns_attached_identity() {
        let req = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, ()) = req.into_parts();
        parts.extensions.insert(CurrentUser::from(test_user()));

        let current = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .expect("identity should be extracted");
        assert_eq!(current.username, "alice");
    }
}
