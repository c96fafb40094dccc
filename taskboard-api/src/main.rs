//! # Taskboard API Server
//!
//! Task-tracking backend with bearer-token authentication, role-based
//! authorization, and a status state machine over tasks.
//!
//! ## Architecture
//!
//! - Authentication endpoints (register, login, refresh) issuing revocable
//!   access/refresh token pairs
//! - Task CRUD, assignment, and status endpoints behind a fail-closed
//!   bearer filter
//! - Startup seeding from a JSON file
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-api
//! ```

use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
    seed,
};
use taskboard_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    migrations::ensure_database_exists(&config.database.url).await?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let state = AppState::new(db, config.clone());

    // Seeding is best-effort: a bad seed file never stops the server
    if let Err(e) = seed::load_seed_data(&state).await {
        tracing::warn!("Seed data loading failed: {}", e);
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
