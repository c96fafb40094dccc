/// Database models for Taskboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and their roles
/// - `token`: Revocable bearer-token session records
/// - `task`: Tasks and the status state machine
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{CreateUser, Role, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         username: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         role: Role::User,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod user;
pub mod token;
pub mod task;
