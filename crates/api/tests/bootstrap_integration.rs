//! Integration tests for startup seeding of default roles and the root
//! account.

mod common;

use arena_api::config::RootAccountConfig;
use arena_api::services::bootstrap;
use common::create_test_app;
use domain::models::role::ListRolesQuery;
use serde_json::json;
use shared::password::verify_password;

#[tokio::test]
async fn test_seed_creates_default_hierarchy() {
    let app = create_test_app();
    app.seed_roles().await;

    let repo = app.role_repo();
    let root = repo.find_by_name("root").await.unwrap().unwrap();
    let admin = repo.find_by_name("admin").await.unwrap().unwrap();
    let player = repo.find_by_name("player").await.unwrap().unwrap();

    let mut actual = root.descendants.clone();
    actual.sort();
    let mut expected = vec![admin.id, player.id];
    expected.sort();
    assert_eq!(actual, expected);
    assert_eq!(admin.descendants, vec![player.id]);
    assert!(player.descendants.is_empty());
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let app = create_test_app();
    app.seed_roles().await;
    app.seed_roles().await;

    let page = app
        .role_repo()
        .find_page(&ListRolesQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn test_seed_skips_non_empty_store() {
    let app = create_test_app();
    let repo = app.role_repo();

    repo.create(domain::models::role::NewRole {
        name: "custom".to_string(),
        status: Default::default(),
        descendants: Vec::new(),
    })
    .await
    .unwrap();

    app.seed_roles().await;

    // The existing hierarchy was left alone; no defaults were added
    let page = repo.find_page(&ListRolesQuery::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(repo.find_by_name("root").await.unwrap().is_none());
}

#[tokio::test]
async fn test_root_account_bootstrap_creates_user() {
    let app = create_test_app();
    app.seed_roles().await;

    let config = RootAccountConfig {
        username: "root".to_string(),
        password: "bootstrap-password".to_string(),
    };
    bootstrap::ensure_root_user(&app.role_repo(), &app.user_repo(), &config)
        .await
        .unwrap();

    let user = app
        .user_repo()
        .find_by_username("root")
        .await
        .unwrap()
        .unwrap();

    let root_role = app.role_repo().find_by_name("root").await.unwrap().unwrap();
    assert_eq!(user.role, root_role.id);
    assert!(verify_password("bootstrap-password", &user.password_hash).unwrap());
}

#[tokio::test]
async fn test_root_account_bootstrap_is_idempotent() {
    let app = create_test_app();
    app.seed_roles().await;

    let config = RootAccountConfig {
        username: "root".to_string(),
        password: "first-password".to_string(),
    };
    bootstrap::ensure_root_user(&app.role_repo(), &app.user_repo(), &config)
        .await
        .unwrap();

    // A second run with a different password must not touch the account
    let changed = RootAccountConfig {
        username: "root".to_string(),
        password: "second-password".to_string(),
    };
    bootstrap::ensure_root_user(&app.role_repo(), &app.user_repo(), &changed)
        .await
        .unwrap();

    let user = app
        .user_repo()
        .find_by_username("root")
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("first-password", &user.password_hash).unwrap());
}

#[tokio::test]
async fn test_root_account_bootstrap_skips_when_unconfigured() {
    let app = create_test_app();
    app.seed_roles().await;

    bootstrap::ensure_root_user(
        &app.role_repo(),
        &app.user_repo(),
        &RootAccountConfig::default(),
    )
    .await
    .unwrap();

    assert!(app
        .user_repo()
        .find_by_username("")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_seeded_roles_survive_normal_usage() {
    let app = create_test_app();
    app.seed_roles().await;
    let token = common::test_token();

    // A role created after seeding is linked under root automatically
    let response = app
        .request(common::json_request_with_auth(
            axum::http::Method::POST,
            "/api/v1/roles",
            json!({ "name": "moderator" }),
            &token,
        ))
        .await;
    let moderator = common::assert_json_response(response, axum::http::StatusCode::CREATED).await;

    let root = app.role_repo().find_by_name("root").await.unwrap().unwrap();
    let moderator_id = moderator["id"].as_str().unwrap().parse().unwrap();
    assert!(root.descendants.contains(&moderator_id));
}
