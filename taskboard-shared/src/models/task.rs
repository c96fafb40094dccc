/// Task model, status state machine, and database operations
///
/// Tasks move through a three-state lifecycle with a terminal end state:
///
/// ```text
/// TODO → IN_PROGRESS → DONE
/// TODO → DONE
/// ```
///
/// DONE has no outgoing transitions, and no state may transition to
/// itself. The dedicated status-update path enforces this table; the
/// full-replace update path deliberately does not, so a task's owner can
/// force-set the status while editing the task wholesale.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Finished; terminal
    Done,
}

impl TaskStatus {
    /// Status as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Checks if the status is terminal (no outgoing transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Checks if a transition to `target` is legal
    ///
    /// Same-state transitions are illegal, including DONE → DONE.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            (TaskStatus::Todo, TaskStatus::InProgress) => true,
            (TaskStatus::Todo, TaskStatus::Done) => true,
            (TaskStatus::InProgress, TaskStatus::Done) => true,
            _ => false,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    /// Low priority
    Low,

    /// Medium priority
    Medium,

    /// High priority
    High,
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Title (required, non-empty)
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// User the task is assigned to, if any
    pub assignee_id: Option<Uuid>,

    /// User who created the task; immutable after creation
    pub creator_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Title (required, non-empty)
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional assignee (must exist; resolved by the caller)
    pub assignee_id: Option<Uuid>,

    /// Creator; always the authenticated requester
    pub creator_id: Uuid,
}

/// Input for the full-replace update
///
/// Every field is written: an absent `assignee_id` clears the assignment,
/// an absent `description` clears the description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: String,

    /// New description (None clears)
    pub description: Option<String>,

    /// New status; NOT transition-checked on this path
    pub status: TaskStatus,

    /// New priority
    pub priority: TaskPriority,

    /// New assignee (None clears)
    pub assignee_id: Option<Uuid>,
}

impl Task {
    /// Whether `user_id` created this task
    pub fn is_created_by(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }

    /// Whether `user_id` is the current assignee
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assignee_id == Some(user_id)
    }

    /// Ownership predicate for mutation: creator or current assignee
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.is_created_by(user_id) || self.is_assigned_to(user_id)
    }

    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced user does not exist (foreign key
    /// violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, assignee_id, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, status, priority, assignee_id, creator_id,
                      created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assignee_id)
        .bind(data.creator_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, returning None if absent
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assignee_id, creator_id,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Replaces a task's mutable fields (full update)
    ///
    /// The creator and timestamps are untouched except for `updated_at`.
    /// Returns the updated task, or None if the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, priority = $5,
                assignee_id = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, priority, assignee_id, creator_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Sets a task's status
    ///
    /// Transition legality is the caller's responsibility; the dedicated
    /// status endpoint checks [`TaskStatus::can_transition_to`] first.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, priority, assignee_id, creator_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Assigns a task to a user
    pub async fn set_assignee(
        pool: &PgPool,
        id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET assignee_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, priority, assignee_id, creator_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task by ID; true if a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Paged list with optional exact-match filters
    ///
    /// An absent filter is unconstrained. Newest tasks first.
    pub async fn list(
        pool: &PgPool,
        status: Option<TaskStatus>,
        assignee_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assignee_id, creator_id,
                   created_at, updated_at
            FROM tasks
            WHERE ($1::task_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR assignee_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(assignee_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks assigned to a user
    pub async fn find_by_assignee(
        pool: &PgPool,
        assignee_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assignee_id, creator_id,
                   created_at, updated_at
            FROM tasks
            WHERE assignee_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(assignee_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks created by a user
    pub async fn find_by_creator(
        pool: &PgPool,
        creator_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assignee_id, creator_id,
                   created_at, updated_at
            FROM tasks
            WHERE creator_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks in a given status
    pub async fn find_by_status(
        pool: &PgPool,
        status: TaskStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assignee_id, creator_id,
                   created_at, updated_at
            FROM tasks
            WHERE status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}
