//! Integration tests for role management endpoints.
//!
//! Tests cover:
//! - POST /api/v1/roles (create, uniqueness, root linkage, player rules)
//! - GET /api/v1/roles (filtering, sorting, pagination)
//! - GET /api/v1/roles/:id
//! - PATCH /api/v1/roles/:id (descendant algebra, protected rename)
//! - DELETE /api/v1/roles/:id (protected delete, name reuse)

mod common;

use axum::http::{Method, StatusCode};
use common::{
    assert_json_response, create_test_app, delete_request_with_auth, get_request_with_auth,
    json_request_with_auth, test_token,
};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_role(app: &common::TestApp, token: &str, body: Value) -> Value {
    let response = app
        .request(json_request_with_auth(
            Method::POST,
            "/api/v1/roles",
            body,
            token,
        ))
        .await;
    assert_json_response(response, StatusCode::CREATED).await
}

#[tokio::test]
async fn test_create_role_success() {
    let app = create_test_app();
    let token = test_token();

    let body = create_role(&app, &token, json!({ "name": "builder" })).await;

    assert_eq!(body["name"], "builder");
    assert_eq!(body["status"], "active");
    assert_eq!(body["descendants"], json!([]));
    assert!(body["id"].as_str().is_some());
    assert!(body["created_at"].as_str().is_some());
}

#[tokio::test]
async fn test_create_role_requires_auth() {
    let app = create_test_app();

    let request = common::json_request(Method::POST, "/api/v1/roles", json!({ "name": "x" }));
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_role_duplicate_name_conflicts() {
    let app = create_test_app();
    let token = test_token();

    create_role(&app, &token, json!({ "name": "builder" })).await;

    let response = app
        .request(json_request_with_auth(
            Method::POST,
            "/api/v1/roles",
            json!({ "name": "builder" }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn test_create_second_root_conflicts() {
    let app = create_test_app();
    let token = test_token();

    create_role(&app, &token, json!({ "name": "root" })).await;

    let response = app
        .request(json_request_with_auth(
            Method::POST,
            "/api/v1/roles",
            json!({ "name": "root" }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn test_create_role_links_into_root_descendants() {
    let app = create_test_app();
    let token = test_token();

    let root = create_role(&app, &token, json!({ "name": "root" })).await;
    let admin = create_role(&app, &token, json!({ "name": "admin" })).await;

    let response = app
        .request(get_request_with_auth(
            &format!("/api/v1/roles/{}", root["id"].as_str().unwrap()),
            &token,
        ))
        .await;
    let root_after = assert_json_response(response, StatusCode::OK).await;

    let descendants = root_after["descendants"].as_array().unwrap();
    assert!(descendants.contains(&admin["id"]));
}

#[tokio::test]
async fn test_create_player_with_descendants_is_rejected() {
    let app = create_test_app();
    let token = test_token();

    let other = create_role(&app, &token, json!({ "name": "other" })).await;

    let response = app
        .request(json_request_with_auth(
            Method::POST,
            "/api/v1/roles",
            json!({ "name": "player", "descendants": [other["id"]] }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_create_role_empty_name_is_rejected() {
    let app = create_test_app();
    let token = test_token();

    let response = app
        .request(json_request_with_auth(
            Method::POST,
            "/api/v1/roles",
            json!({ "name": "" }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_get_role_not_found() {
    let app = create_test_app();
    let token = test_token();

    let response = app
        .request(get_request_with_auth(
            &format!("/api/v1/roles/{}", Uuid::new_v4()),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn test_list_roles_pagination() {
    let app = create_test_app();
    let token = test_token();

    for i in 0..25 {
        create_role(&app, &token, json!({ "name": format!("role-{i:02}") })).await;
    }

    let response = app
        .request(get_request_with_auth(
            "/api/v1/roles?page=3&limit=10&sort_by=name&sort_order=asc",
            &token,
        ))
        .await;
    let body = assert_json_response(response, StatusCode::OK).await;

    assert_eq!(body["total"], 25);
    assert_eq!(body["page"], 3);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["total_pages"], 3);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["name"], "role-20");
}

#[tokio::test]
async fn test_list_roles_name_filter_is_substring_match() {
    let app = create_test_app();
    let token = test_token();

    create_role(&app, &token, json!({ "name": "game-admin" })).await;
    create_role(&app, &token, json!({ "name": "builder" })).await;

    let response = app
        .request(get_request_with_auth("/api/v1/roles?name=ADMIN", &token))
        .await;
    let body = assert_json_response(response, StatusCode::OK).await;

    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "game-admin");
}

#[tokio::test]
async fn test_list_roles_status_filter() {
    let app = create_test_app();
    let token = test_token();

    create_role(&app, &token, json!({ "name": "live" })).await;
    create_role(
        &app,
        &token,
        json!({ "name": "parked", "status": "inactive" }),
    )
    .await;

    let response = app
        .request(get_request_with_auth("/api/v1/roles?status=inactive", &token))
        .await;
    let body = assert_json_response(response, StatusCode::OK).await;

    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "parked");
}

#[tokio::test]
async fn test_list_roles_rejects_oversized_limit() {
    let app = create_test_app();
    let token = test_token();

    let response = app
        .request(get_request_with_auth("/api/v1/roles?limit=1000", &token))
        .await;

    assert_json_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_update_role_replace_descendants() {
    let app = create_test_app();
    let token = test_token();

    let a = create_role(&app, &token, json!({ "name": "a" })).await;
    let b = create_role(&app, &token, json!({ "name": "b" })).await;
    let target = create_role(&app, &token, json!({ "name": "target" })).await;
    let target_id = target["id"].as_str().unwrap();

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{target_id}"),
            json!({ "descendants": [a["id"], b["id"]], "operation": "replace" }),
            &token,
        ))
        .await;
    let body = assert_json_response(response, StatusCode::OK).await;

    let descendants = body["descendants"].as_array().unwrap();
    assert_eq!(descendants.len(), 2);
    assert!(descendants.contains(&a["id"]));
    assert!(descendants.contains(&b["id"]));
}

#[tokio::test]
async fn test_update_role_add_then_remove_descendants() {
    let app = create_test_app();
    let token = test_token();

    let a = create_role(&app, &token, json!({ "name": "a" })).await;
    let b = create_role(&app, &token, json!({ "name": "b" })).await;
    let target = create_role(&app, &token, json!({ "name": "target" })).await;
    let target_id = target["id"].as_str().unwrap();

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{target_id}"),
            json!({ "descendants": [a["id"], b["id"]], "operation": "add" }),
            &token,
        ))
        .await;
    let body = assert_json_response(response, StatusCode::OK).await;
    assert_eq!(body["descendants"].as_array().unwrap().len(), 2);

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{target_id}"),
            json!({ "descendants": [a["id"]], "operation": "remove" }),
            &token,
        ))
        .await;
    let body = assert_json_response(response, StatusCode::OK).await;

    let descendants = body["descendants"].as_array().unwrap();
    assert_eq!(descendants.len(), 1);
    assert!(descendants.contains(&b["id"]));
}

#[tokio::test]
async fn test_update_role_add_unknown_descendant_is_rejected() {
    let app = create_test_app();
    let token = test_token();

    let target = create_role(&app, &token, json!({ "name": "target" })).await;
    let missing = Uuid::new_v4();

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{}", target["id"].as_str().unwrap()),
            json!({ "descendants": [missing], "operation": "add" }),
            &token,
        ))
        .await;
    let body = assert_json_response(response, StatusCode::BAD_REQUEST).await;

    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains(&missing.to_string()));
}

#[tokio::test]
async fn test_update_role_remove_unknown_descendant_is_rejected() {
    let app = create_test_app();
    let token = test_token();

    let target = create_role(&app, &token, json!({ "name": "target" })).await;
    let missing = Uuid::new_v4();

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{}", target["id"].as_str().unwrap()),
            json!({ "descendants": [missing], "operation": "remove" }),
            &token,
        ))
        .await;
    let body = assert_json_response(response, StatusCode::BAD_REQUEST).await;

    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains(&missing.to_string()));
}

#[tokio::test]
async fn test_update_role_remove_own_id_is_rejected() {
    let app = create_test_app();
    let token = test_token();

    let target = create_role(&app, &token, json!({ "name": "target" })).await;
    let target_id = target["id"].as_str().unwrap();

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{target_id}"),
            json!({ "descendants": [target_id], "operation": "remove" }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_update_role_cannot_be_own_descendant() {
    let app = create_test_app();
    let token = test_token();

    let target = create_role(&app, &token, json!({ "name": "target" })).await;
    let target_id = target["id"].as_str().unwrap();

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{target_id}"),
            json!({ "descendants": [target_id], "operation": "add" }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_update_player_with_empty_descendants_is_rejected() {
    let app = create_test_app();
    let token = test_token();

    let player = create_role(&app, &token, json!({ "name": "player" })).await;

    // Supplying the field at all is rejected for the player role, even when
    // the set is empty.
    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{}", player["id"].as_str().unwrap()),
            json!({ "descendants": [] }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_update_protected_role_rename_conflicts() {
    let app = create_test_app();
    let token = test_token();

    let root = create_role(&app, &token, json!({ "name": "root" })).await;

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{}", root["id"].as_str().unwrap()),
            json!({ "name": "overlord" }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn test_update_role_rename_to_taken_name_conflicts() {
    let app = create_test_app();
    let token = test_token();

    create_role(&app, &token, json!({ "name": "taken" })).await;
    let target = create_role(&app, &token, json!({ "name": "target" })).await;

    let response = app
        .request(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/roles/{}", target["id"].as_str().unwrap()),
            json!({ "name": "taken" }),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn test_delete_role_hides_it_and_frees_name() {
    let app = create_test_app();
    let token = test_token();

    let temp = create_role(&app, &token, json!({ "name": "temp" })).await;
    let temp_id = temp["id"].as_str().unwrap();

    let response = app
        .request(delete_request_with_auth(
            &format!("/api/v1/roles/{temp_id}"),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The deleted role is gone from reads
    let response = app
        .request(get_request_with_auth(
            &format!("/api/v1/roles/{temp_id}"),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The name is free for a new role
    create_role(&app, &token, json!({ "name": "temp" })).await;
}

#[tokio::test]
async fn test_delete_protected_role_conflicts() {
    let app = create_test_app();
    let token = test_token();

    let player = create_role(&app, &token, json!({ "name": "player" })).await;

    let response = app
        .request(delete_request_with_auth(
            &format!("/api/v1/roles/{}", player["id"].as_str().unwrap()),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn test_delete_unknown_role_is_not_found() {
    let app = create_test_app();
    let token = test_token();

    let response = app
        .request(delete_request_with_auth(
            &format!("/api/v1/roles/{}", Uuid::new_v4()),
            &token,
        ))
        .await;

    assert_json_response(response, StatusCode::NOT_FOUND).await;
}
