use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::models::role::Role;
use domain::models::user::User;
use persistence::repositories::UserRepository;
use persistence::store::Store;
use shared::jwt::JwtKeys;

use crate::config::Config;
use crate::routes::{auth, health, roles, users};
use crate::services::{AuthService, RoleService};

/// Role store behind a trait object so the app wires the same router over
/// Postgres in production and the in-memory store in tests.
pub type SharedRoleStore = Arc<dyn Store<Role>>;
pub type SharedUserStore = Arc<dyn Store<User>>;

#[derive(Clone)]
pub struct AppState {
    pub roles: RoleService,
    pub auth: AuthService,
    pub users: UserRepository<SharedUserStore>,
    pub jwt: Arc<JwtKeys>,
    pub config: Arc<Config>,
}

pub fn create_app(
    config: Config,
    role_store: SharedRoleStore,
    user_store: SharedUserStore,
) -> Router {
    let config = Arc::new(config);
    let jwt = Arc::new(JwtKeys::from_secret(
        &config.jwt.secret,
        config.jwt.token_expiry_secs,
    ));

    let state = AppState {
        roles: RoleService::new(role_store),
        auth: AuthService::new(user_store.clone(), jwt.clone()),
        users: UserRepository::new(user_store),
        jwt,
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1/auth", auth::router())
        .nest("/api/v1/roles", roles::router())
        .nest("/api/v1/users", users::router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
