use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use arena_api::app::{self, SharedRoleStore, SharedUserStore};
use arena_api::services::bootstrap;
use arena_api::{config, middleware};
use persistence::repositories::{RoleRepository, UserRepository};
use persistence::store::{PgStore, SoftDeletePolicy};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!("Starting Arena API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.database).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let policy = SoftDeletePolicy::default();
    let role_store: SharedRoleStore = Arc::new(PgStore::new(pool.clone(), policy.clone()));
    let user_store: SharedUserStore = Arc::new(PgStore::new(pool, policy));

    // Seed default roles and the root account on first startup
    let role_repo = RoleRepository::new(role_store.clone());
    bootstrap::seed_default_roles(&role_repo).await?;
    bootstrap::ensure_root_user(
        &role_repo,
        &UserRepository::new(user_store.clone()),
        &config.root_account,
    )
    .await?;

    // Build application
    let addr = config.socket_addr()?;
    let app = app::create_app(config, role_store, user_store);

    // Start server
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
