//! Authentication service.

use std::sync::Arc;

use shared::jwt::JwtKeys;
use shared::password::verify_password;
use tracing::info;

use domain::models::user::{LoginRequest, LoginResponse, UserStatus};
use persistence::repositories::UserRepository;

use crate::app::SharedUserStore;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AuthService {
    repo: UserRepository<SharedUserStore>,
    jwt: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(store: SharedUserStore, jwt: Arc<JwtKeys>) -> Self {
        Self {
            repo: UserRepository::new(store),
            jwt,
        }
    }

    /// Verifies credentials and issues a bearer token.
    ///
    /// Unknown usernames, bad passwords and inactive accounts all collapse
    /// into the same response so callers cannot probe for valid usernames.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let user = self
            .repo
            .find_by_username(&request.username)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(invalid_credentials)?;

        if user.status != UserStatus::Active {
            return Err(invalid_credentials());
        }

        if !verify_password(&request.password, &user.password_hash).unwrap_or(false) {
            return Err(invalid_credentials());
        }

        let token = self
            .jwt
            .issue(user.id, user.role)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        self.repo
            .record_login(user.id)
            .await
            .map_err(ApiError::from)?;

        info!(username = %user.username, "User logged in");

        Ok(LoginResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiry_secs,
        })
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid username or password".to_string())
}
