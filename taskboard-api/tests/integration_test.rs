/// Integration tests for the Taskboard API
///
/// These tests verify the full system end-to-end against a live Postgres:
/// - Token issuance and the single-active-session invariant
/// - Login revocation and refresh choreography
/// - Task lifecycle with the status state machine
/// - Ownership- and role-based authorization outcomes
/// - Fail-closed authentication on every task route

mod common;

use axum::http::StatusCode;
use common::{create_task, register_user, TestContext, TEST_PASSWORD};
use serde_json::json;
use taskboard_shared::models::token::Token;
use taskboard_shared::models::user::Role;
use uuid::Uuid;

/// Health endpoint is public and reports database connectivity
#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request("GET", "/health", None, None).await.unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

/// Registration issues exactly one live token record
#[tokio::test]
async fn test_register_issues_single_live_token() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();

    let live = Token::find_all_valid_by_user(&ctx.db, alice.id)
        .await
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].token, alice.access_token);
    assert!(live[0].is_live());
}

/// Registering the same email twice is a conflict
#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "username": format!("{}-again", alice.username),
                "email": format!("{}@example.com", alice.username),
                "password": TEST_PASSWORD,
                "role": "USER",
            })),
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

/// Login rotates the session: predecessors get both flags set
#[tokio::test]
async fn test_login_revokes_prior_tokens() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();
    let first_token = alice.access_token.clone();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({
                "username": alice.username,
                "password": alice.password,
            })),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    let second_token = body["access_token"].as_str().unwrap().to_string();
    assert_ne!(first_token, second_token);

    // Exactly one live record remains, and it's the new one
    let live = Token::find_all_valid_by_user(&ctx.db, alice.id)
        .await
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].token, second_token);

    // The predecessor has both flags set
    let old = Token::find_by_token(&ctx.db, &first_token)
        .await
        .unwrap()
        .unwrap();
    assert!(old.expired);
    assert!(old.revoked);

    // And is rejected by the API, while the new token works
    let (status, _) = ctx
        .request("GET", "/v1/tasks/my-tasks", Some(&first_token), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request("GET", "/v1/tasks/my-tasks", Some(&second_token), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
}

/// Bad credentials are rejected with an enumeration-safe message
#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({
                "username": alice.username,
                "password": "WrongPass123",
            })),
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown user yields the identical message
    let (status2, body2) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({
                "username": "no-such-user",
                "password": "WrongPass123",
            })),
        )
        .await
        .unwrap();

    assert_eq!(status2, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], body2["message"]);
}

/// Task routes reject anonymous and garbage-token requests alike
#[tokio::test]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = ctx
        .request("GET", "/v1/tasks/my-tasks", None, None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A forged token degrades to anonymous, not to an error
    let (status, _) = ctx
        .request("GET", "/v1/tasks/my-tasks", Some("not-a-real-token"), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Create → IN_PROGRESS → (no going back) → DONE → terminal
#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();

    // Create with no assignee
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(&alice.access_token),
            Some(json!({
                "title": "Fix bug",
                "status": "TODO",
                "priority": "HIGH",
            })),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Fix bug");
    assert_eq!(body["status"], "TODO");
    assert_eq!(body["priority"], "HIGH");
    assert_eq!(body["creator"]["id"], alice.id.to_string());
    assert!(body["assignee"].is_null());

    let task_id = body["id"].as_str().unwrap().to_string();

    // TODO -> IN_PROGRESS is legal for the creator
    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}/status?status=IN_PROGRESS", task_id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");

    // IN_PROGRESS -> TODO is not
    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}/status?status=TODO", task_id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Invalid status transition"));

    // IN_PROGRESS -> DONE is legal
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}/status?status=DONE", task_id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);

    // DONE is terminal, including DONE -> DONE
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}/status?status=DONE", task_id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Own-scope permission without ownership is not enough
#[tokio::test]
async fn test_stranger_cannot_update_status() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();
    let bob = register_user(&ctx, Role::User).await.unwrap();

    let task_id = create_task(&ctx, &alice.access_token, "Alice's task", None)
        .await
        .unwrap();

    // Bob holds task:update:own but is neither creator nor assignee
    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}/status?status=IN_PROGRESS", task_id),
            Some(&bob.access_token),
            None,
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

/// Delete is all-scope only: admins delete anything, owners nothing
#[tokio::test]
async fn test_delete_permissions() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();
    let admin = register_user(&ctx, Role::Admin).await.unwrap();

    let task_id = create_task(&ctx, &alice.access_token, "Doomed task", None)
        .await
        .unwrap();

    // The creator cannot delete their own task
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/tasks/{}", task_id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The admin deletes it regardless of ownership
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/tasks/{}", task_id),
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    // It's gone
    let (status, _) = ctx
        .request(
            "GET",
            &format!("/v1/tasks/{}", task_id),
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Assignment needs the assign permission AND creatorship
#[tokio::test]
async fn test_assign_flow() {
    let ctx = TestContext::new().await.unwrap();

    let admin = register_user(&ctx, Role::Admin).await.unwrap();
    let alice = register_user(&ctx, Role::User).await.unwrap();
    let bob = register_user(&ctx, Role::User).await.unwrap();

    // Admin assigns a task they created
    let task_id = create_task(&ctx, &admin.access_token, "Assignable task", None)
        .await
        .unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/v1/tasks/{}/assign?assignee_id={}", task_id, bob.id),
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignee"]["id"], bob.id.to_string());

    // Unknown assignee is a 404
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/tasks/{}/assign?assignee_id={}", task_id, Uuid::new_v4()),
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A regular user lacks task:assign even on their own task
    let alices_task = create_task(&ctx, &alice.access_token, "Alice's task", None)
        .await
        .unwrap();
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/tasks/{}/assign?assignee_id={}", alices_task, bob.id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin who didn't create the task cannot assign it either
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/tasks/{}/assign?assignee_id={}", alices_task, bob.id),
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// Refresh mints a new access token, revokes predecessors, and passes the
/// refresh token through unchanged
#[tokio::test]
async fn test_refresh_flow() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();
    let old_access = alice.access_token.clone();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/refresh",
            Some(&alice.refresh_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);

    let new_access = body["access_token"].as_str().unwrap().to_string();
    assert_ne!(new_access, old_access);
    assert_eq!(body["refresh_token"], alice.refresh_token);
    assert_eq!(body["user"]["username"], alice.username);

    // Predecessor revoked, successor live
    let (status, _) = ctx
        .request("GET", "/v1/tasks/my-tasks", Some(&old_access), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request("GET", "/v1/tasks/my-tasks", Some(&new_access), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);

    let live = Token::find_all_valid_by_user(&ctx.db, alice.id)
        .await
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].token, new_access);
}

/// Refresh is lenient on a missing header and strict on a wrong-type token
#[tokio::test]
async fn test_refresh_leniency() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();

    // No header: silent no-op, empty 200, nothing revoked
    let (status, body) = ctx
        .request("POST", "/v1/auth/refresh", None, None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let live = Token::find_all_valid_by_user(&ctx.db, alice.id)
        .await
        .unwrap();
    assert_eq!(live.len(), 1);

    // An access token is not a refresh token
    let (status, _) = ctx
        .request(
            "POST",
            "/v1/auth/refresh",
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// List scoping: users see only their own slice, admins see everything
#[tokio::test]
async fn test_list_scoping() {
    let ctx = TestContext::new().await.unwrap();

    let admin = register_user(&ctx, Role::Admin).await.unwrap();
    let alice = register_user(&ctx, Role::User).await.unwrap();
    let bob = register_user(&ctx, Role::User).await.unwrap();

    // Unscoped listing requires task:read:all
    let (status, _) = ctx
        .request("GET", "/v1/tasks", Some(&alice.access_token), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Querying someone else's assignments is denied too
    let (status, _) = ctx
        .request(
            "GET",
            &format!("/v1/tasks?assignee={}", bob.id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Querying one's own assignments is allowed
    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/tasks?assignee={}", alice.id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_array());

    // Admins list everything, filters optional
    let (status, body) = ctx
        .request(
            "GET",
            "/v1/tasks?status=TODO&limit=5",
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().len() <= 5);

    // The by-status listing is all-scope as well
    let (status, _) = ctx
        .request(
            "GET",
            "/v1/tasks/status/TODO",
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            "GET",
            "/v1/tasks/status/TODO",
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
}

/// Single-read own-scope hinges on assignment, not creatorship
#[tokio::test]
async fn test_get_task_read_scope() {
    let ctx = TestContext::new().await.unwrap();

    let admin = register_user(&ctx, Role::Admin).await.unwrap();
    let alice = register_user(&ctx, Role::User).await.unwrap();

    let task_id = create_task(&ctx, &alice.access_token, "Unassigned task", None)
        .await
        .unwrap();

    // The creator is not the assignee: own-scope read denies
    let (status, _) = ctx
        .request(
            "GET",
            &format!("/v1/tasks/{}", task_id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admins read anything
    let (status, _) = ctx
        .request(
            "GET",
            &format!("/v1/tasks/{}", task_id),
            Some(&admin.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);

    // my-tasks and created-by-me remain available to the creator
    let (status, body) = ctx
        .request(
            "GET",
            "/v1/tasks/created-by-me",
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == task_id.to_string()));
}

/// The full-replace update force-sets status without transition checks
#[tokio::test]
async fn test_full_update_bypasses_transition_checks() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();
    let bob = register_user(&ctx, Role::User).await.unwrap();

    let task_id = create_task(&ctx, &alice.access_token, "Rewindable task", None)
        .await
        .unwrap();

    // Drive the task to the terminal state via the guarded path
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}/status?status=DONE", task_id),
            Some(&alice.access_token),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);

    // A full update by the creator rewinds it: no transition validation here
    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}", task_id),
            Some(&alice.access_token),
            Some(json!({
                "title": "Rewindable task",
                "description": "back to the backlog",
                "status": "TODO",
                "priority": "LOW",
            })),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "TODO");
    assert_eq!(body["priority"], "LOW");
    assert!(body["assignee"].is_null());

    // A stranger still cannot touch it
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/v1/tasks/{}", task_id),
            Some(&bob.access_token),
            Some(json!({
                "title": "Hijacked",
                "status": "TODO",
                "priority": "LOW",
            })),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// Referencing a nonexistent assignee fails with 404, and an empty title
/// fails validation
#[tokio::test]
async fn test_create_task_input_errors() {
    let ctx = TestContext::new().await.unwrap();

    let alice = register_user(&ctx, Role::User).await.unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(&alice.access_token),
            Some(json!({
                "title": "Orphan assignment",
                "status": "TODO",
                "priority": "LOW",
                "assignee_id": Uuid::new_v4(),
            })),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Assignee not found");

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(&alice.access_token),
            Some(json!({
                "title": "",
                "status": "TODO",
                "priority": "LOW",
            })),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}
