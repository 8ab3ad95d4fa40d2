//! User domain model.
//!
//! Users reference a role by id and ride on the same soft-deletable document
//! store as roles. Credential hashing and token issuance live in `shared`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User lifecycle status. `Deleted` is a terminal soft-delete marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Deleted,
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    /// Id of the role this user holds.
    pub role: Uuid,
    pub status: UserStatus,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Builds a user ready for insertion. The store reassigns id and
    /// timestamps on create.
    pub fn new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: new.username,
            password_hash: new.password_hash,
            role: new.role,
            status: new.status,
            balance: new.balance,
            last_login: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Input to user creation, already validated at the edge.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Uuid,
    pub status: UserStatus,
    pub balance: i64,
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Login response with a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User representation safe to return to clients (no credential material).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Uuid,
    pub status: UserStatus,
    pub balance: i64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            status: user.status,
            balance: user.balance,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
