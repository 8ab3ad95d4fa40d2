//! Role management route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::role::{CreateRoleRequest, ListRolesQuery, UpdateRoleRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route(
            "/:id",
            get(get_role).patch(update_role).delete(delete_role),
        )
}

/// Create a role.
///
/// POST /api/v1/roles
#[axum::debug_handler(state = AppState)]
async fn create_role(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<CreateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let role = state.roles.create(request).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// List roles with filtering, sorting and pagination.
///
/// GET /api/v1/roles
#[axum::debug_handler(state = AppState)]
async fn list_roles(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListRolesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.validate()?;
    let page = state.roles.list(&query).await?;
    Ok(Json(page))
}

/// Get a role by id.
///
/// GET /api/v1/roles/:id
#[axum::debug_handler(state = AppState)]
async fn get_role(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state.roles.get(id).await?;
    Ok(Json(role))
}

/// Update a role.
///
/// PATCH /api/v1/roles/:id
#[axum::debug_handler(state = AppState)]
async fn update_role(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let role = state.roles.update(id, request).await?;
    Ok(Json(role))
}

/// Soft-delete a role.
///
/// DELETE /api/v1/roles/:id
#[axum::debug_handler(state = AppState)]
async fn delete_role(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.roles.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
