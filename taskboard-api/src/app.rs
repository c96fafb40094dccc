/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::middleware::authenticate_request;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the
/// config is behind an Arc for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                      # Health check (public)
/// └── /v1/                         # API v1 (versioned)
///     ├── /auth/                   # Authentication (public - bootstrap exemption)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     └── /tasks/                  # Task operations (behind the bearer filter)
///         ├── POST   /
///         ├── GET    /?status=&assignee=&limit=&offset=
///         ├── GET    /my-tasks
///         ├── GET    /created-by-me
///         ├── GET    /status/:status
///         ├── GET    /:task_id
///         ├── PUT    /:task_id
///         ├── DELETE /:task_id
///         ├── POST   /:task_id/assign?assignee_id=
///         └── PUT    /:task_id/status?status=
/// ```
///
/// The bearer filter attaches an identity when it can and otherwise lets
/// the request through anonymous; handlers reject anonymous requests via
/// the `CurrentUser` extractor.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public: these bootstrap the session)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Task routes (behind the bearer authentication filter)
    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/my-tasks", get(routes::tasks::my_tasks))
        .route("/created-by-me", get(routes::tasks::created_by_me))
        .route("/status/:status", get(routes::tasks::tasks_by_status))
        .route(
            "/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:task_id/assign", post(routes::tasks::assign_task))
        .route("/:task_id/status", put(routes::tasks::update_task_status))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bearer authentication filter layer
///
/// Resolves the request's bearer token to an identity at most once and
/// always forwards the request; failures leave it anonymous (fail-closed,
/// the reason stays in the logs).
async fn bearer_auth_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    authenticate_request(&state.db, state.jwt_secret(), &mut req).await;
    next.run(req).await
}
