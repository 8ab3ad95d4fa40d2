//! Common test utilities for integration tests.
//!
//! Integration tests run the full router over the in-memory store backend,
//! so they exercise routing, extraction, services and repositories without
//! needing a database.

// Allow dead code in this module - these are helper utilities that may not be
// used by every integration test file.
#![allow(dead_code)]

use std::sync::Arc;

use arena_api::app::{create_app, SharedRoleStore, SharedUserStore};
use arena_api::config::{Config, JwtConfig, LoggingConfig, RootAccountConfig, ServerConfig};
use arena_api::services::bootstrap;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use domain::models::role::Role;
use domain::models::user::{NewUser, User, UserStatus};
use persistence::db::DatabaseConfig;
use persistence::repositories::{RoleRepository, UserRepository};
use persistence::store::{MemStore, SoftDeletePolicy};
use serde_json::Value;
use shared::jwt::JwtKeys;
use shared::password::hash_password;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_secs: 1,
            idle_timeout_secs: 1,
        },
        logging: LoggingConfig {
            level: "error".to_string(),
            format: "pretty".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            token_expiry_secs: 3600,
        },
        root_account: RootAccountConfig::default(),
    }
}

/// An app wired over in-memory stores, plus handles to the stores for
/// direct seeding and inspection.
pub struct TestApp {
    pub app: Router,
    pub role_store: SharedRoleStore,
    pub user_store: SharedUserStore,
}

pub fn create_test_app() -> TestApp {
    let policy = SoftDeletePolicy::default();
    let role_store: SharedRoleStore = Arc::new(MemStore::<Role>::new(policy.clone()));
    let user_store: SharedUserStore = Arc::new(MemStore::<User>::new(policy));

    let app = create_app(test_config(), role_store.clone(), user_store.clone());

    TestApp {
        app,
        role_store,
        user_store,
    }
}

impl TestApp {
    pub fn role_repo(&self) -> RoleRepository<SharedRoleStore> {
        RoleRepository::new(self.role_store.clone())
    }

    pub fn user_repo(&self) -> UserRepository<SharedUserStore> {
        UserRepository::new(self.user_store.clone())
    }

    /// Seeds the default role hierarchy the way startup does.
    pub async fn seed_roles(&self) {
        bootstrap::seed_default_roles(&self.role_repo())
            .await
            .expect("Failed to seed default roles");
    }

    /// Creates an active user with the given credentials and role.
    pub async fn create_user(&self, username: &str, password: &str, role: Uuid) -> User {
        let password_hash = hash_password(password).expect("Failed to hash password");
        self.user_repo()
            .create(NewUser {
                username: username.to_string(),
                password_hash,
                role,
                status: UserStatus::Active,
                balance: 0,
            })
            .await
            .expect("Failed to create test user")
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// Issues a valid bearer token without going through the login route.
pub fn test_token() -> String {
    let keys = JwtKeys::from_secret(TEST_JWT_SECRET, 3600);
    keys.issue(Uuid::new_v4(), Uuid::new_v4())
        .expect("Failed to issue test token")
}

pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_request_with_auth(method: Method, uri: &str, body: Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn parse_response_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
}

/// Asserts status and returns the parsed body in one step.
pub async fn assert_json_response(response: Response<Body>, expected: StatusCode) -> Value {
    let status = response.status();
    let body = parse_response_body(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}
