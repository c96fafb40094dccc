/// Authentication endpoints
///
/// This module is the authentication core: it registers users, verifies
/// logins, and refreshes access tokens, maintaining the single-active-
/// session invariant: every issuance revokes all of the user's previously
/// live tokens before persisting the new one, so at most one live access
/// token exists per user at any time. (This is a deliberate session
/// policy, not refresh-token rotation.)
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user, returns a token pair
/// - `POST /v1/auth/login` - Verify credentials, rotate tokens
/// - `POST /v1/auth/refresh` - Mint a new access token from a refresh token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        jwt::{self, Claims, TokenType},
        password,
    },
    models::{
        token::Token,
        user::{CreateUser, Role, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique username
    #[validate(length(min = 3, max = 100, message = "Username must be 3-100 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role for the new account
    pub role: Role,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Password
    pub password: String,
}

/// User identity projection, safe to return to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// Role
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Response carrying identity and the token pair
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Authenticated identity
    pub user: UserResponse,

    /// Access token; persisted server-side as the live session record
    pub access_token: String,

    /// Refresh token
    pub refresh_token: String,
}

/// Signs an access/refresh token pair for a username
///
/// Lifetimes come from configuration; nothing is persisted here.
fn issue_token_pair(state: &AppState, username: &str) -> Result<(String, String), ApiError> {
    let access_claims = Claims::with_expiration(
        username,
        TokenType::Access,
        Duration::minutes(state.config.jwt.access_ttl_minutes),
    );
    let refresh_claims = Claims::with_expiration(
        username,
        TokenType::Refresh,
        Duration::days(state.config.jwt.refresh_ttl_days),
    );

    let access = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok((access, refresh))
}

/// Registers a user and issues their first token pair
///
/// Shared between the HTTP handler and the seed loader.
///
/// # Errors
///
/// - `Conflict` if the email is already registered
/// - `ValidationError` if the password is too weak
pub(crate) async fn register_user(
    state: &AppState,
    req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "User with email {} already exists",
            req.email
        )));
    }

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    // First session for a fresh user: nothing to revoke yet
    let (access_token, refresh_token) = issue_token_pair(state, &user.username)?;
    Token::save(&state.db, user.id, &access_token).await?;

    Ok(AuthResponse {
        user: UserResponse::from(&user),
        access_token,
        refresh_token,
    })
}

/// Register endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "SecureP4ss",
///   "role": "USER"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: email already exists
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let response = register_user(&state, req).await?;
    Ok(Json(response))
}

/// Login endpoint
///
/// Verifies the credentials, revokes every previously live token for the
/// user, and persists a freshly issued access token.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "SecureP4ss"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown username or wrong password; the message
///   is identical in both cases so accounts cannot be enumerated
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let (access_token, refresh_token) = issue_token_pair(&state, &user.username)?;

    // Revoke-then-insert: predecessors die before the new session lives
    Token::revoke_all_for_user(&state.db, user.id).await?;
    Token::save(&state.db, user.id, &access_token).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        access_token,
        refresh_token,
    }))
}

/// Token refresh endpoint
///
/// Reads the refresh token from the `Authorization: Bearer <token>`
/// header. A missing or malformed header is a silent no-op (empty 200) so
/// unauthenticated probes learn nothing about token validity; the same
/// applies when the token fails validation against the stored user. A
/// token whose subject matches no stored user is a server-side
/// inconsistency and propagates as an internal error.
///
/// On success the access token is re-minted and persisted (revoking its
/// predecessors); the refresh token is passed through unchanged.
///
/// # Errors
///
/// - `401 Unauthorized`: the token is malformed, expired, or not a
///   refresh token
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(refresh_token) = bearer else {
        return Ok(StatusCode::OK.into_response());
    };

    let claims = jwt::validate_refresh_token(refresh_token, state.jwt_secret())?;

    let user = User::find_by_username(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!(
                "Refresh token subject {:?} has no matching user",
                claims.sub
            ))
        })?;

    if !jwt::is_token_valid(refresh_token, state.jwt_secret(), &user.username) {
        return Ok(StatusCode::OK.into_response());
    }

    let access_claims = Claims::with_expiration(
        user.username.as_str(),
        TokenType::Access,
        Duration::minutes(state.config.jwt.access_ttl_minutes),
    );
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Token::revoke_all_for_user(&state.db, user.id).await?;
    Token::save(&state.db, user.id, &access_token).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        access_token,
        refresh_token: refresh_token.to_string(),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "SecureP4ss".to_string(),
            role: Role::User,
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "SecureP4ss".to_string(),
            role: Role::User,
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
            role: Role::User,
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_user_response_omits_password_hash() {
        // Compile-time shape check: the projection has exactly the public
        // identity fields
        let json = serde_json::to_value(UserResponse {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Admin,
        })
        .unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "ADMIN");
    }
}
