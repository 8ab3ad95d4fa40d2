//! Authentication route handlers.

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use validator::Validate;

use domain::models::user::LoginRequest;

use crate::app::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Authenticate with username and password.
///
/// POST /api/v1/auth/login
#[axum::debug_handler(state = AppState)]
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}
