//! JWT authentication extractor.
//!
//! Validates the Bearer token in the Authorization header and exposes the
//! authenticated user's identity to handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller identity taken from a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User id from the subject claim.
    pub user_id: Uuid,
    /// Id of the role the user held when the token was issued.
    pub role_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let claims = state
            .jwt
            .verify(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;
        let role_id = claims
            .role_id()
            .map_err(|_| ApiError::Unauthorized("Invalid token role".to_string()))?;

        Ok(AuthUser { user_id, role_id })
    }
}
