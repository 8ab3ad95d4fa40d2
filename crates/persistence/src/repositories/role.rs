//! Role repository.
//!
//! Specializes the generic store for roles: root singleton and automatic
//! root linkage, live-name uniqueness checks, bulk existence validation, and
//! protected deletion with name mangling.

use chrono::Utc;
use serde_json::{json, Value};
use shared::pagination::Page;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use domain::models::role::{
    check_hierarchy, is_protected_name, ListRolesQuery, NewRole, Role, DELETED_NAME_MARKER,
    ROOT_ROLE_NAME,
};
use domain::Error;

use crate::store::{Document, Filter, Sort, Store};

impl Document for Role {
    const COLLECTION: &'static str = "roles";
    const UNIQUE_FIELDS: &'static [&'static str] = &["name"];

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Repository for role persistence, wrapping a soft-deletable store.
#[derive(Debug, Clone)]
pub struct RoleRepository<S> {
    store: S,
}

impl<S: Store<Role>> RoleRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a role, enforcing the root singleton and linking non-root
    /// roles into the root's descendant set.
    ///
    /// The pre-check on the root name is an early rejection for a clearer
    /// error; the partial unique index on live names is the authoritative
    /// boundary under concurrency. The root linkage is a second write: if the
    /// process dies in between, the role exists without the link
    /// (forward-only best effort, no rollback).
    pub async fn create(&self, new: NewRole) -> domain::Result<Role> {
        check_hierarchy(&new.name, None, &new.descendants)?;

        if new.name == ROOT_ROLE_NAME && self.find_by_name(ROOT_ROLE_NAME).await?.is_some() {
            return Err(Error::Conflict(format!(
                "The \"{ROOT_ROLE_NAME}\" role already exists"
            )));
        }

        let role = self
            .store
            .create(Role::new(new.name, new.status, new.descendants))
            .await?;

        if role.name != ROOT_ROLE_NAME {
            if let Some(root) = self.find_by_name(ROOT_ROLE_NAME).await? {
                let added = self
                    .store
                    .add_to_set(root.id, "descendants", json!(role.id))
                    .await?;
                if added {
                    debug!(role = %role.name, "linked new role into root descendants");
                }
            }
        }

        Ok(role)
    }

    pub async fn find_by_id(&self, id: Uuid) -> domain::Result<Option<Role>> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> domain::Result<Option<Role>> {
        Ok(self.store.find_one(&Filter::new().eq("name", name)).await?)
    }

    /// Whether a live role other than `exclude` already holds `name`.
    pub async fn is_name_taken(&self, name: &str, exclude: Option<Uuid>) -> domain::Result<bool> {
        let existing = self.find_by_name(name).await?;
        Ok(matches!(existing, Some(role) if exclude != Some(role.id)))
    }

    /// Fails listing every id that does not resolve to a live role.
    pub async fn validate_all_exist(&self, ids: &[Uuid]) -> domain::Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let values = ids.iter().map(|id| json!(id.to_string())).collect();
        let found = self.store.find(&Filter::new().is_in("id", values)).await?;
        let found_ids: HashSet<Uuid> = found.iter().map(|role| role.id).collect();

        let mut missing: Vec<String> = ids
            .iter()
            .filter(|id| !found_ids.contains(id))
            .map(ToString::to_string)
            .collect();
        missing.sort();
        missing.dedup();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "Missing role ids: {}",
                missing.join(", ")
            )))
        }
    }

    /// Lists roles with name/status filtering, sorting and pagination.
    pub async fn find_page(&self, query: &ListRolesQuery) -> domain::Result<Page<Role>> {
        let mut filter = Filter::new();
        if let Some(name) = &query.name {
            filter = filter.contains("name", name);
        }
        if let Some(status) = query.status {
            filter = filter.eq("status", status.as_str());
        }

        let sort = Sort::new(query.sort_by.field(), query.sort_order);
        Ok(self
            .store
            .find_paginated(&filter, query.page, query.limit, &sort)
            .await?)
    }

    /// Applies a patch to a live role, re-checking the player rule on the
    /// patch itself as a defensive backstop behind the service.
    pub async fn update(&self, id: Uuid, patch: Value) -> domain::Result<Option<Role>> {
        guard_patch(&patch)?;
        let updated = self
            .store
            .update_one(&Filter::new().eq("id", id.to_string()), patch)
            .await?;
        Ok(updated)
    }

    /// Soft-deletes a role unless it is protected.
    ///
    /// The role is renamed with a deletion marker and timestamp first, so the
    /// original name is freed for reuse while the retained record stays
    /// distinguishable from any live name. Unknown (or already deleted) ids
    /// fail with `NotFound`.
    pub async fn delete(&self, id: Uuid) -> domain::Result<()> {
        let Some(role) = self.find_by_id(id).await? else {
            return Err(Error::NotFound(format!("Role with id {id} not found")));
        };

        if is_protected_name(&role.name) {
            return Err(Error::Conflict(format!(
                "The \"{}\" role is protected and cannot be deleted",
                role.name
            )));
        }

        let mangled = format!(
            "{}{}{}",
            role.name,
            DELETED_NAME_MARKER,
            Utc::now().timestamp_millis()
        );
        self.store
            .update_one(
                &Filter::new().eq("id", id.to_string()),
                json!({ "name": mangled }),
            )
            .await?;
        self.store.soft_delete(id).await?;
        Ok(())
    }

    /// Whether any live role exists at all. Used by the bootstrap seeder's
    /// coarse idempotency check.
    pub async fn any_exist(&self) -> domain::Result<bool> {
        Ok(!self.store.find(&Filter::new()).await?.is_empty())
    }
}

/// Rejects patches that would name a role "player" while supplying a
/// non-empty descendant set.
fn guard_patch(patch: &Value) -> domain::Result<()> {
    let Some(name) = patch.get("name").and_then(Value::as_str) else {
        return Ok(());
    };

    let descendants: Vec<Uuid> = patch
        .get("descendants")
        .and_then(Value::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect()
        })
        .unwrap_or_default();

    check_hierarchy(name, None, &descendants)
}
