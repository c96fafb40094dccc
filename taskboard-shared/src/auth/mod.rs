/// Authentication and authorization utilities
///
/// This module provides the security primitives for Taskboard:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: Bearer token generation and validation
/// - [`authorization`]: Role/permission mapping and the task access decision rule
/// - [`middleware`]: Request authentication filter and the `CurrentUser` extractor
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with per-password random salts
/// - **Bearer Tokens**: HS256-signed JWTs with server-side revocation records
/// - **Fail-closed Filter**: token resolution failures degrade to anonymous,
///   never to an authenticated identity
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new("alice", TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!")?;
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod jwt;
pub mod middleware;
pub mod authorization;
