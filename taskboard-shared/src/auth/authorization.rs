/// Authorization core: roles, permissions, and the task access decision rule
///
/// Taskboard uses role-based access control with two permission scopes:
///
/// - **all-scope** permissions (e.g. `task:read:all`) grant an operation
///   unconditionally.
/// - **own-scope** permissions (e.g. `task:read:own`) grant an operation
///   only when the requester owns the resource: created it, is assigned
///   to it, or is querying their own tasks, depending on the operation.
///
/// Each role maps to an immutable permission set fixed at compile time;
/// permissions are never combined or recomputed at runtime. The decision
/// rule for every task operation is:
///
/// ```text
/// allow = has(all-scope) OR (has(own-scope) AND ownership)
/// ```
///
/// where `ownership` is evaluated by the caller against the operation's
/// predicate (see [`TaskAction`]). These functions are pure: the store is
/// never consulted here.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::{is_authorized, TaskAction};
/// use taskboard_shared::models::user::Role;
///
/// // Admins delete anything; regular users never do
/// assert!(is_authorized(Role::Admin, TaskAction::Delete, false));
/// assert!(!is_authorized(Role::User, TaskAction::Delete, true));
///
/// // Regular users update only tasks they own
/// assert!(is_authorized(Role::User, TaskAction::Update, true));
/// assert!(!is_authorized(Role::User, TaskAction::Update, false));
/// ```

use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Requester's role lacks the required permission (or holds only the
    /// own-scope variant without owning the resource)
    #[error("Not authorized to {0} this task")]
    Denied(&'static str),
}

/// Capability tags assignable to roles
///
/// A role has exactly the permissions listed in its static set; the string
/// form is the wire/audit representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    /// Read any task
    TaskReadAll,

    /// Update any task
    TaskUpdateAll,

    /// Create tasks on behalf of anyone
    TaskCreateAll,

    /// Delete any task
    TaskDeleteAll,

    /// Assign tasks to users
    TaskAssign,

    /// Read tasks the requester created or is assigned to
    TaskReadOwn,

    /// Update tasks the requester created or is assigned to
    TaskUpdateOwn,

    /// Create tasks as oneself
    TaskCreate,

    /// Read user accounts
    UserReadAll,
}

impl Permission {
    /// Permission tag as its string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::TaskReadAll => "task:read:all",
            Permission::TaskUpdateAll => "task:update:all",
            Permission::TaskCreateAll => "task:create:all",
            Permission::TaskDeleteAll => "task:delete:all",
            Permission::TaskAssign => "task:assign",
            Permission::TaskReadOwn => "task:read:own",
            Permission::TaskUpdateOwn => "task:update:own",
            Permission::TaskCreate => "task:create",
            Permission::UserReadAll => "user:read:all",
        }
    }
}

/// Static permission set for regular users
const USER_PERMISSIONS: &[Permission] = &[
    Permission::TaskReadOwn,
    Permission::TaskUpdateOwn,
    Permission::TaskCreate,
    Permission::UserReadAll,
];

/// Static permission set for administrators
const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::TaskReadAll,
    Permission::TaskUpdateAll,
    Permission::TaskDeleteAll,
    Permission::TaskCreateAll,
    Permission::TaskAssign,
    Permission::UserReadAll,
];

impl Role {
    /// The immutable permission set for this role
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::User => USER_PERMISSIONS,
            Role::Admin => ADMIN_PERMISSIONS,
        }
    }

    /// Checks whether this role holds a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Task operations subject to authorization
///
/// Each operation names its all-scope permission and, where one exists, the
/// own-scope fallback. The ownership predicate differs per operation and is
/// evaluated by the caller:
///
/// | action       | all-scope         | own-scope         | ownership predicate            |
/// |--------------|-------------------|-------------------|--------------------------------|
/// | Create       | `task:create:all` | `task:create`     | always (creator is requester)  |
/// | List         | `task:read:all`   | `task:read:own`   | assignee filter == requester   |
/// | Read         | `task:read:all`   | `task:read:own`   | requester is assignee          |
/// | Update       | `task:update:all` | `task:update:own` | requester is creator/assignee  |
/// | UpdateStatus | `task:update:all` | `task:update:own` | requester is creator/assignee  |
/// | Assign       | `task:assign`     | (none)            | (creator check in service)     |
/// | Delete       | `task:delete:all` | (none)            | no ownership fallback          |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Create a new task
    Create,

    /// List tasks (optionally filtered)
    List,

    /// Read a single task
    Read,

    /// Replace a task's fields
    Update,

    /// Change a task's status
    UpdateStatus,

    /// Assign a task to a user
    Assign,

    /// Delete a task
    Delete,
}

impl TaskAction {
    /// All-scope permission that grants this action unconditionally
    pub fn all_scope(&self) -> Permission {
        match self {
            TaskAction::Create => Permission::TaskCreateAll,
            TaskAction::List | TaskAction::Read => Permission::TaskReadAll,
            TaskAction::Update | TaskAction::UpdateStatus => Permission::TaskUpdateAll,
            TaskAction::Assign => Permission::TaskAssign,
            TaskAction::Delete => Permission::TaskDeleteAll,
        }
    }

    /// Own-scope permission, if this action has an ownership fallback
    pub fn own_scope(&self) -> Option<Permission> {
        match self {
            TaskAction::Create => Some(Permission::TaskCreate),
            TaskAction::List | TaskAction::Read => Some(Permission::TaskReadOwn),
            TaskAction::Update | TaskAction::UpdateStatus => Some(Permission::TaskUpdateOwn),
            TaskAction::Assign | TaskAction::Delete => None,
        }
    }

    /// Action name for error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Create => "create",
            TaskAction::List => "list",
            TaskAction::Read => "read",
            TaskAction::Update => "update",
            TaskAction::UpdateStatus => "update the status of",
            TaskAction::Assign => "assign",
            TaskAction::Delete => "delete",
        }
    }
}

/// The access decision rule
///
/// `is_owner` is the caller-evaluated ownership predicate for `action`
/// (see the table on [`TaskAction`]). Pass `false` when the predicate does
/// not apply; it is only consulted for the own-scope fallback.
pub fn is_authorized(role: Role, action: TaskAction, is_owner: bool) -> bool {
    if role.has_permission(action.all_scope()) {
        return true;
    }

    match action.own_scope() {
        Some(own) => role.has_permission(own) && is_owner,
        None => false,
    }
}

/// Checks the decision rule, producing an error suitable for the boundary
///
/// # Errors
///
/// Returns `AuthzError::Denied` when neither the all-scope permission nor
/// the ownership fallback grants the action.
pub fn require_authorized(role: Role, action: TaskAction, is_owner: bool) -> Result<(), AuthzError> {
    if is_authorized(role, action, is_owner) {
        Ok(())
    } else {
        Err(AuthzError::Denied(action.as_str()))
    }
}
