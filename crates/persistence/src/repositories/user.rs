//! User repository.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use domain::models::user::{NewUser, User};

use crate::store::{Document, Filter, Store};

impl Document for User {
    const COLLECTION: &'static str = "users";
    const UNIQUE_FIELDS: &'static [&'static str] = &["username"];

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Repository for user persistence, wrapping a soft-deletable store.
#[derive(Debug, Clone)]
pub struct UserRepository<S> {
    store: S,
}

impl<S: Store<User>> UserRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: NewUser) -> domain::Result<User> {
        Ok(self.store.create(User::new(new)).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> domain::Result<Option<User>> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> domain::Result<Option<User>> {
        Ok(self
            .store
            .find_one(&Filter::new().eq("username", username))
            .await?)
    }

    /// Stamps the user's last login time.
    pub async fn record_login(&self, id: Uuid) -> domain::Result<()> {
        self.store
            .update_one(
                &Filter::new().eq("id", id.to_string()),
                json!({ "last_login": Utc::now() }),
            )
            .await?;
        Ok(())
    }
}
