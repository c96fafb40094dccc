/// Bearer token generation and validation
///
/// Taskboard issues two kinds of HS256-signed JWTs: short-lived access
/// tokens that authorize API calls, and longer-lived refresh tokens used
/// solely to mint new access tokens. Everything in this module is a pure
/// function of the signing secret, the claims, and the wall clock;
/// revocation state lives in [`crate::models::token`], not here.
///
/// # Claims
///
/// - `sub`: username of the token holder
/// - `iss`: always "taskboard"
/// - `iat` / `exp` / `nbf`: issued-at, expiry, not-before (Unix timestamps)
/// - `token_type`: access or refresh
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{create_token, extract_username, Claims, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let claims = Claims::new("alice", TokenType::Access);
/// let token = create_token(&claims, secret)?;
///
/// assert_eq!(extract_username(&token, secret)?, "alice");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped into and required of every token
const ISSUER: &str = "taskboard";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was signed for a different issuer
    #[error("Invalid issuer: expected {ISSUER}")]
    InvalidIssuer,

    /// Token is of the wrong type for this operation
    #[error("Expected {expected} token, got {actual} token")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived), authorizes API calls
    Access,

    /// Refresh token (long-lived), only mints new access tokens
    Refresh,
}

impl TokenType {
    /// Default expiration window for this token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::minutes(60),
            TokenType::Refresh => Duration::days(30),
        }
    }

    /// Token type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims for a Taskboard bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - username of the token holder
    pub sub: String,

    /// Issuer - always "taskboard"
    pub iss: String,

    /// Unique token id
    ///
    /// Timestamps are second-granular, so two tokens minted for the same
    /// user in the same second would otherwise be byte-identical; the jti
    /// keeps every issuance a distinct stored record.
    pub jti: Uuid,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default expiration for the token type
    pub fn new(username: impl Into<String>, token_type: TokenType) -> Self {
        Self::with_expiration(username, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom expiration window
    ///
    /// # Example
    ///
    /// ```
    /// use taskboard_shared::auth::jwt::{Claims, TokenType};
    /// use chrono::Duration;
    ///
    /// let claims = Claims::with_expiration("alice", TokenType::Access, Duration::minutes(15));
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(
        username: impl Into<String>,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: username.into(),
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }

    /// Checks if the token has expired by wall clock
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed token from claims
///
/// Signs with HS256 using the server-held secret. The secret should be at
/// least 32 bytes and come from the environment, never from source.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies the signature, the expiry and not-before windows, and the
/// issuer. Expired tokens are reported distinctly so callers can tell a
/// stale session from a forged one.
///
/// # Errors
///
/// - `JwtError::Expired` if the expiry has passed
/// - `JwtError::InvalidIssuer` if the issuer claim is not "taskboard"
/// - `JwtError::ValidationError` for signature or format failures
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and checks it is an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongTokenType {
            expected: TokenType::Access.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and checks it is a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongTokenType {
            expected: TokenType::Refresh.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Extracts the subject (username) from a validated token
///
/// The signature and temporal checks run first; a username is only ever
/// returned from a token that passed them.
pub fn extract_username(token: &str, secret: &str) -> Result<String, JwtError> {
    let claims = validate_token(token, secret)?;
    Ok(claims.sub)
}

/// Checks whether a token is valid for the given username
///
/// True iff the token passes all cryptographic and temporal checks AND its
/// subject matches `username`. Returns false rather than an error: callers
/// treat any failure identically (the token does not authenticate the user).
pub fn is_token_valid(token: &str, secret: &str, username: &str) -> bool {
    match validate_token(token, secret) {
        Ok(claims) => claims.sub == username,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_type_expiration() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::minutes(60));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(30));
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("alice", TokenType::Access);

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "taskboard");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new("alice", TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, "alice");
        assert_eq!(validated.iss, "taskboard");
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new("alice", TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        assert!(validate_token(&token, "another-secret-thats-also-32-bytes").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        // Negative duration = already expired
        let claims = Claims::with_expiration("alice", TokenType::Access, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_access_and_refresh_types_are_enforced() {
        let access = create_token(&Claims::new("alice", TokenType::Access), SECRET).unwrap();
        let refresh = create_token(&Claims::new("alice", TokenType::Refresh), SECRET).unwrap();

        assert!(validate_access_token(&access, SECRET).is_ok());
        assert!(validate_access_token(&refresh, SECRET).is_err());

        assert!(validate_refresh_token(&refresh, SECRET).is_ok());
        assert!(validate_refresh_token(&access, SECRET).is_err());
    }

    #[test]
    fn test_extract_username() {
        let token = create_token(&Claims::new("bob", TokenType::Refresh), SECRET).unwrap();
        assert_eq!(extract_username(&token, SECRET).unwrap(), "bob");

        // Garbage never yields a username
        assert!(extract_username("not-a-token", SECRET).is_err());
    }

    #[test]
    fn test_is_token_valid_checks_subject() {
        let token = create_token(&Claims::new("alice", TokenType::Access), SECRET).unwrap();

        assert!(is_token_valid(&token, SECRET, "alice"));
        assert!(!is_token_valid(&token, SECRET, "bob"));
        assert!(!is_token_valid(&token, "another-secret-thats-also-32-bytes", "alice"));
    }

    #[test]
    fn test_successive_tokens_differ() {
        // Same subject, same second: the jti still makes them distinct,
        // and both validate.
        let t1 = create_token(&Claims::new("alice", TokenType::Access), SECRET).unwrap();
        let t2 = create_token(&Claims::new("alice", TokenType::Access), SECRET).unwrap();

        assert_ne!(t1, t2);
        assert!(is_token_valid(&t1, SECRET, "alice"));
        assert!(is_token_valid(&t2, SECRET, "alice"));
    }
}
