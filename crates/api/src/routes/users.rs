//! User route handlers.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use domain::models::user::UserResponse;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new().route("/:username", get(get_user))
}

/// Get a user by username. Credential material is never returned.
///
/// GET /api/v1/users/:username
#[axum::debug_handler(state = AppState)]
async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User \"{username}\" not found")))?;

    Ok(Json(UserResponse::from(user)))
}
