/// Task endpoints
///
/// Every handler takes the authenticated identity as an explicit
/// [`CurrentUser`] parameter and runs two layers of checks:
///
/// 1. The authorization core's decision rule
///    (`all-scope OR own-scope + ownership`, see
///    [`taskboard_shared::auth::authorization`])
/// 2. For mutations, the unconditional mutation-rights check: update and
///    status changes require the requester to be creator or assignee, and
///    assignment requires the creator, regardless of role
///
/// Existence is checked before authority, so a missing task is always 404
/// and a denied one always 403.
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create
/// - `GET    /v1/tasks?status=&assignee=&limit=&offset=` - Paged list
/// - `GET    /v1/tasks/:task_id` - Read one
/// - `PUT    /v1/tasks/:task_id` - Full update (force-sets status)
/// - `DELETE /v1/tasks/:task_id` - Delete
/// - `POST   /v1/tasks/:task_id/assign?assignee_id=` - Assign
/// - `PUT    /v1/tasks/:task_id/status?status=` - Status update (transition-checked)
/// - `GET    /v1/tasks/my-tasks` - Tasks assigned to the requester
/// - `GET    /v1/tasks/created-by-me` - Tasks created by the requester
/// - `GET    /v1/tasks/status/:status` - Tasks by status

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use taskboard_shared::{
    auth::{
        authorization::{require_authorized, TaskAction},
        middleware::CurrentUser,
    },
    models::{
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create/update request body
#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    /// Title (required, non-empty)
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional assignee; must reference an existing user
    pub assignee_id: Option<Uuid>,
}

/// User summary embedded in task responses
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Task projection returned by every task endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Description
    pub description: Option<String>,

    /// Status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Assignee summary, if assigned
    pub assignee: Option<UserSummary>,

    /// Creator summary
    pub creator: UserSummary,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    /// Builds the projection, resolving creator and assignee summaries
    async fn load(pool: &PgPool, task: Task) -> Result<Self, ApiError> {
        let creator = User::find_by_id(pool, task.creator_id)
            .await?
            .ok_or_else(|| {
                ApiError::InternalError(format!("Task {} references a missing creator", task.id))
            })?;

        let assignee = match task.assignee_id {
            Some(id) => User::find_by_id(pool, id)
                .await?
                .map(|u| UserSummary::from(&u)),
            None => None,
        };

        Ok(Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            assignee,
            creator: UserSummary::from(&creator),
            created_at: task.created_at,
            updated_at: task.updated_at,
        })
    }

    async fn load_many(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<Self>, ApiError> {
        let mut responses = Vec::with_capacity(tasks.len());
        for task in tasks {
            responses.push(Self::load(pool, task).await?);
        }
        Ok(responses)
    }
}

/// Query parameters for the paged list
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Exact-match status filter
    pub status: Option<TaskStatus>,

    /// Exact-match assignee filter
    pub assignee: Option<Uuid>,

    /// Page size (default 20, max 100)
    pub limit: Option<i64>,

    /// Page offset (default 0)
    pub offset: Option<i64>,
}

/// Query parameters for assignment
#[derive(Debug, Deserialize)]
pub struct AssignQuery {
    /// Target user
    pub assignee_id: Uuid,
}

/// Query parameters for the status update
#[derive(Debug, Deserialize)]
pub struct UpdateStatusQuery {
    /// Requested new status
    pub status: TaskStatus,
}

/// Resolves an optional assignee id against the store
async fn resolve_assignee(
    pool: &PgPool,
    assignee_id: Option<Uuid>,
) -> Result<Option<User>, ApiError> {
    match assignee_id {
        Some(id) => {
            let user = User::find_by_id(pool, id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Loads a task or fails with 404
async fn find_task(pool: &PgPool, task_id: Uuid) -> Result<Task, ApiError> {
    Task::find_by_id(pool, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Create a task
///
/// The creator is always the authenticated requester; an assignee id, if
/// given, must reference an existing user.
///
/// # Errors
///
/// - `404 Not Found`: assignee id given but absent
/// - `422 Unprocessable Entity`: empty title
pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<TaskRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    // Creating as oneself: the own-scope predicate holds trivially
    require_authorized(user.role, TaskAction::Create, true)?;

    let assignee = resolve_assignee(&state.db, req.assignee_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: assignee.map(|u| u.id),
            creator_id: user.id,
        },
    )
    .await?;

    let response = TaskResponse::load(&state.db, task).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Paged task list with optional exact-match filters
///
/// Regular users may only query their own tasks (assignee filter equal to
/// their id); admins list anything.
pub async fn list_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    // Own-scope listing: the assignee being queried is the requester
    let owns_filter = query.assignee == Some(user.id);
    require_authorized(user.role, TaskAction::List, owns_filter)?;

    if let Some(assignee_id) = query.assignee {
        if User::find_by_id(&state.db, assignee_id).await?.is_none() {
            return Err(ApiError::NotFound("Assignee not found".to_string()));
        }
    }

    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let tasks = Task::list(&state.db, query.status, query.assignee, limit, offset).await?;
    Ok(Json(TaskResponse::load_many(&state.db, tasks).await?))
}

/// Read a single task
///
/// The own-scope predicate for single reads is assignment: a regular user
/// sees a task only if they are its assignee.
pub async fn get_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = find_task(&state.db, task_id).await?;

    require_authorized(user.role, TaskAction::Read, task.is_assigned_to(user.id))?;

    Ok(Json(TaskResponse::load(&state.db, task).await?))
}

/// Full update: replaces title, description, status, priority, assignee
///
/// Only the creator or current assignee may update, regardless of role.
/// This path deliberately skips transition validation: owners may
/// force-set the status while editing the task wholesale; the dedicated
/// status endpoint is the guarded one.
pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(req): Json<TaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()?;

    let task = find_task(&state.db, task_id).await?;

    require_authorized(user.role, TaskAction::Update, task.is_owned_by(user.id))?;
    if !task.is_owned_by(user.id) {
        return Err(ApiError::Forbidden(
            "You can only update tasks you created or are assigned to".to_string(),
        ));
    }

    // An absent assignee_id clears the assignment
    let assignee = resolve_assignee(&state.db, req.assignee_id).await?;

    let updated = Task::update(
        &state.db,
        task.id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: assignee.map(|u| u.id),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::load(&state.db, updated).await?))
}

/// Delete a task
///
/// Requires the all-scope delete permission; there is no ownership
/// fallback, so regular users cannot delete even their own tasks.
pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = find_task(&state.db, task_id).await?;

    require_authorized(user.role, TaskAction::Delete, false)?;

    Task::delete(&state.db, task.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign a task to a user
///
/// Requires the assign permission, and only the task's creator may
/// assign it.
///
/// # Errors
///
/// - `404 Not Found`: unknown task or assignee
/// - `403 Forbidden`: missing permission, or requester is not the creator
pub async fn assign_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<Uuid>,
    Query(query): Query<AssignQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let task = find_task(&state.db, task_id).await?;

    require_authorized(user.role, TaskAction::Assign, false)?;
    if !task.is_created_by(user.id) {
        return Err(ApiError::Forbidden(
            "You can only assign tasks you created".to_string(),
        ));
    }

    let assignee = User::find_by_id(&state.db, query.assignee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;

    let updated = Task::set_assignee(&state.db, task.id, assignee.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::load(&state.db, updated).await?))
}

/// Status update, validated against the state machine
///
/// Only the creator or assignee may change the status, and the change
/// must be a legal transition (TODO→IN_PROGRESS, TODO→DONE,
/// IN_PROGRESS→DONE; DONE is terminal).
///
/// # Errors
///
/// - `400 Bad Request`: illegal transition, including same-state
/// - `403 Forbidden`: requester is neither creator nor assignee
pub async fn update_task_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<Uuid>,
    Query(query): Query<UpdateStatusQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let task = find_task(&state.db, task_id).await?;

    require_authorized(user.role, TaskAction::UpdateStatus, task.is_owned_by(user.id))?;
    if !task.is_owned_by(user.id) {
        return Err(ApiError::Forbidden(
            "You can only update the status of tasks you created or are assigned to".to_string(),
        ));
    }

    if !task.status.can_transition_to(query.status) {
        return Err(ApiError::BadRequest(format!(
            "Invalid status transition from {} to {}",
            task.status.as_str(),
            query.status.as_str()
        )));
    }

    let updated = Task::update_status(&state.db, task.id, query.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::load(&state.db, updated).await?))
}

/// Tasks assigned to the requester
pub async fn my_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    // Querying oneself: ownership holds by definition
    require_authorized(user.role, TaskAction::List, true)?;

    let tasks = Task::find_by_assignee(&state.db, user.id).await?;
    Ok(Json(TaskResponse::load_many(&state.db, tasks).await?))
}

/// Tasks created by the requester
pub async fn created_by_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    require_authorized(user.role, TaskAction::List, true)?;

    let tasks = Task::find_by_creator(&state.db, user.id).await?;
    Ok(Json(TaskResponse::load_many(&state.db, tasks).await?))
}

/// All tasks in a given status
///
/// An unscoped listing: requires the all-scope read permission.
pub async fn tasks_by_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(status): Path<TaskStatus>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    require_authorized(user.role, TaskAction::List, false)?;

    let tasks = Task::find_by_status(&state.db, status).await?;
    Ok(Json(TaskResponse::load_many(&state.db, tasks).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_request_requires_title() {
        let empty_title = TaskRequest {
            title: "".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::High,
            assignee_id: None,
        };
        assert!(empty_title.validate().is_err());

        let valid = TaskRequest {
            title: "Fix bug".to_string(),
            description: Some("Crash on empty input".to_string()),
            status: TaskStatus::Todo,
            priority: TaskPriority::High,
            assignee_id: None,
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_task_request_deserializes_wire_enums() {
        let req: TaskRequest = serde_json::from_value(serde_json::json!({
            "title": "Fix bug",
            "status": "IN_PROGRESS",
            "priority": "HIGH"
        }))
        .unwrap();

        assert_eq!(req.status, TaskStatus::InProgress);
        assert_eq!(req.priority, TaskPriority::High);
        assert!(req.assignee_id.is_none());
    }
}
