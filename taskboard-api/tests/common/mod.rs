/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and migrations
/// - Request helpers driving the router directly (no network)
/// - Per-test user registration through the real register endpoint
///
/// Tests expect `DATABASE_URL` and `JWT_SECRET` in the environment (a
/// `.env` file works); every registered user gets a unique name so tests
/// are independent and re-runnable.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::models::user::Role;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing the database pool and the app under test
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext { db, app, config })
    }

    /// Sends a request through the router and returns status + JSON body
    ///
    /// An empty response body parses as `Value::Null`.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().call(request).await?;
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, json))
    }
}

/// A user registered through the API for a test
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Password satisfying the strength rules, shared by all test users
pub const TEST_PASSWORD: &str = "TestPass123";

/// Registers a fresh user with a unique name through the register endpoint
pub async fn register_user(ctx: &TestContext, role: Role) -> anyhow::Result<TestUser> {
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("user-{}", &suffix[..12]);

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": TEST_PASSWORD,
                "role": role,
            })),
        )
        .await?;

    anyhow::ensure!(
        status == StatusCode::OK,
        "register failed with {}: {}",
        status,
        body
    );

    Ok(TestUser {
        id: Uuid::parse_str(body["user"]["id"].as_str().expect("user id in response"))?,
        username,
        password: TEST_PASSWORD.to_string(),
        access_token: body["access_token"]
            .as_str()
            .expect("access token in response")
            .to_string(),
        refresh_token: body["refresh_token"]
            .as_str()
            .expect("refresh token in response")
            .to_string(),
    })
}

/// Creates a TODO/HIGH task through the API and returns its id
pub async fn create_task(
    ctx: &TestContext,
    token: &str,
    title: &str,
    assignee_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let mut payload = json!({
        "title": title,
        "status": "TODO",
        "priority": "HIGH",
    });
    if let Some(id) = assignee_id {
        payload["assignee_id"] = json!(id);
    }

    let (status, body) = ctx
        .request("POST", "/v1/tasks", Some(token), Some(payload))
        .await?;

    anyhow::ensure!(
        status == StatusCode::CREATED,
        "create task failed with {}: {}",
        status,
        body
    );

    Ok(Uuid::parse_str(body["id"].as_str().expect("task id"))?)
}
