/// Startup seed-data loader
///
/// Reads a static JSON file describing users and tasks and feeds them
/// through the normal paths: users go through registration (hashing,
/// token issuance, duplicate detection) and tasks through task creation
/// with creator/assignee resolved by email.
///
/// Seeding never blocks startup: a missing file skips seeding, an
/// already-registered user is reused, and any per-item failure is logged
/// and skipped without aborting the rest of the batch.
///
/// # File format
///
/// ```json
/// {
///   "users": [
///     { "username": "alice", "email": "alice@example.com",
///       "password": "...", "role": "USER" }
///   ],
///   "tasks": [
///     { "title": "Fix bug", "description": null,
///       "status": "TODO", "priority": "HIGH",
///       "assignee_email": "alice@example.com",
///       "creator_email": "admin@example.com" }
///   ]
/// }
/// ```

use crate::{
    app::AppState,
    error::ApiError,
    routes::auth::{register_user, RegisterRequest},
};
use serde::Deserialize;
use std::collections::HashMap;
use taskboard_shared::models::{
    task::{CreateTask, Task, TaskPriority, TaskStatus},
    user::{Role, User},
};

/// Top-level seed file structure
#[derive(Debug, Deserialize)]
pub struct SeedData {
    /// Users to register
    pub users: Vec<SeedUser>,

    /// Tasks to create, referencing users by email
    pub tasks: Vec<SeedTask>,
}

/// A user definition in the seed file
#[derive(Debug, Deserialize)]
pub struct SeedUser {
    /// Username
    pub username: String,

    /// Email address (the key tasks reference)
    pub email: String,

    /// Plaintext password; hashed by the register path
    pub password: String,

    /// Role
    pub role: Role,
}

/// A task definition in the seed file
#[derive(Debug, Deserialize)]
pub struct SeedTask {
    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Assignee email, if assigned
    pub assignee_email: Option<String>,

    /// Creator email (must be in the users list)
    pub creator_email: String,
}

/// Loads seed data from the configured path
///
/// A missing file is not an error; a malformed file is (the caller logs
/// and continues). Per-item failures never propagate.
pub async fn load_seed_data(state: &AppState) -> anyhow::Result<()> {
    let path = &state.config.seed.path;

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::info!(path = %path, "No seed data file ({}), skipping seeding", e);
            return Ok(());
        }
    };

    let data: SeedData = serde_json::from_str(&raw)?;
    tracing::info!(
        users = data.users.len(),
        tasks = data.tasks.len(),
        "Loading seed data"
    );

    let user_map = create_users(state, data.users).await;
    create_tasks(state, data.tasks, &user_map).await;

    tracing::info!("Seed data loaded");
    Ok(())
}

/// Registers seed users, reusing accounts that already exist
///
/// Returns an email → user map for task creation.
async fn create_users(state: &AppState, seed_users: Vec<SeedUser>) -> HashMap<String, User> {
    let mut user_map = HashMap::new();

    for seed_user in seed_users {
        match create_user(state, &seed_user).await {
            Ok(user) => {
                user_map.insert(user.email.clone(), user);
            }
            Err(e) => {
                tracing::error!(email = %seed_user.email, "Failed to seed user: {}", e);
            }
        }
    }

    user_map
}

async fn create_user(state: &AppState, seed_user: &SeedUser) -> Result<User, ApiError> {
    if let Some(existing) = User::find_by_email(&state.db, &seed_user.email).await? {
        tracing::info!(email = %seed_user.email, "User already exists, skipping");
        return Ok(existing);
    }

    register_user(
        state,
        RegisterRequest {
            username: seed_user.username.clone(),
            email: seed_user.email.clone(),
            password: seed_user.password.clone(),
            role: seed_user.role,
        },
    )
    .await?;

    let user = User::find_by_email(&state.db, &seed_user.email)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!("Registered user {} not found", seed_user.email))
        })?;

    tracing::info!(username = %user.username, email = %user.email, "Seeded user");
    Ok(user)
}

/// Creates seed tasks, skipping any whose users failed to resolve
async fn create_tasks(state: &AppState, seed_tasks: Vec<SeedTask>, user_map: &HashMap<String, User>) {
    for seed_task in seed_tasks {
        if let Err(e) = create_task(state, &seed_task, user_map).await {
            tracing::error!(title = %seed_task.title, "Failed to seed task: {}", e);
        }
    }
}

async fn create_task(
    state: &AppState,
    seed_task: &SeedTask,
    user_map: &HashMap<String, User>,
) -> Result<(), ApiError> {
    let creator = user_map.get(&seed_task.creator_email).ok_or_else(|| {
        ApiError::NotFound(format!("Creator {} not found", seed_task.creator_email))
    })?;

    let assignee_id = match &seed_task.assignee_email {
        Some(email) => {
            let assignee = user_map
                .get(email)
                .ok_or_else(|| ApiError::NotFound(format!("Assignee {} not found", email)))?;
            Some(assignee.id)
        }
        None => None,
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            title: seed_task.title.clone(),
            description: seed_task.description.clone(),
            status: seed_task.status,
            priority: seed_task.priority,
            assignee_id,
            creator_id: creator.id,
        },
    )
    .await?;

    tracing::info!(title = %task.title, "Seeded task");
    Ok(())
}
