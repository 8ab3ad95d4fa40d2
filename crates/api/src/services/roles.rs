//! Role management service.
//!
//! Orchestrates the role lifecycle on top of the repository: name
//! uniqueness, the descendant-set algebra on update, and the protected-role
//! rules. Storage-level uniqueness (the partial index) remains the
//! authoritative backstop for races past the pre-checks here.

use serde_json::json;
use shared::pagination::Page;
use uuid::Uuid;

use domain::models::role::{
    apply_descendants_op, check_hierarchy, is_protected_name, CreateRoleRequest,
    DescendantsOperation, ListRolesQuery, NewRole, Role, UpdateRoleRequest, PLAYER_ROLE_NAME,
};
use domain::Error;
use persistence::repositories::RoleRepository;

use crate::app::SharedRoleStore;

#[derive(Clone)]
pub struct RoleService {
    repo: RoleRepository<SharedRoleStore>,
}

impl RoleService {
    pub fn new(store: SharedRoleStore) -> Self {
        Self {
            repo: RoleRepository::new(store),
        }
    }

    pub fn repository(&self) -> &RoleRepository<SharedRoleStore> {
        &self.repo
    }

    /// Creates a role after a friendly-error uniqueness pre-check.
    pub async fn create(&self, request: CreateRoleRequest) -> domain::Result<Role> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("Name must not be empty".into()));
        }
        let descendants = request.descendants.unwrap_or_default();

        if self.repo.is_name_taken(&name, None).await? {
            return Err(Error::Conflict(format!(
                "Role with name \"{name}\" already exists"
            )));
        }

        self.repo
            .create(NewRole {
                name,
                status: request.status.unwrap_or_default(),
                descendants,
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> domain::Result<Role> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Role with id {id} not found")))
    }

    pub async fn list(&self, query: &ListRolesQuery) -> domain::Result<Page<Role>> {
        self.repo.find_page(query).await
    }

    /// Applies a partial update.
    ///
    /// An incoming descendant set is validated up front (every id resolves to
    /// a live role, none equals the role itself) and then combined with the
    /// current set according to the requested operation (default: replace).
    pub async fn update(&self, id: Uuid, request: UpdateRoleRequest) -> domain::Result<Role> {
        let existing = self.get(id).await?;

        let name = match &request.name {
            Some(name) => {
                let trimmed = name.trim().to_string();
                if trimmed.is_empty() {
                    return Err(Error::Validation("Name must not be empty".into()));
                }
                trimmed
            }
            None => existing.name.clone(),
        };

        if name != existing.name {
            if is_protected_name(&existing.name) {
                return Err(Error::Conflict(format!(
                    "The \"{}\" role is protected and cannot be renamed",
                    existing.name
                )));
            }
            if self.repo.is_name_taken(&name, Some(id)).await? {
                return Err(Error::Conflict(format!(
                    "Role with name \"{name}\" already exists"
                )));
            }
        }

        let descendants = match &request.descendants {
            Some(incoming) => {
                if name == PLAYER_ROLE_NAME {
                    return Err(Error::Validation(format!(
                        "The \"{PLAYER_ROLE_NAME}\" role cannot have any descendants"
                    )));
                }
                if incoming.contains(&id) {
                    return Err(Error::Validation(
                        "A role cannot be a descendant of itself".into(),
                    ));
                }
                self.repo.validate_all_exist(incoming).await?;

                let op = request.operation.unwrap_or(DescendantsOperation::Replace);
                apply_descendants_op(&existing.descendants, incoming, op)
            }
            None => existing.descendants.clone(),
        };

        check_hierarchy(&name, Some(id), &descendants)?;

        let mut patch = json!({
            "name": name,
            "descendants": descendants,
        });
        if let Some(status) = request.status {
            patch["status"] = json!(status);
        }

        self.repo
            .update(id, patch)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Role with id {id} not found")))
    }

    pub async fn delete(&self, id: Uuid) -> domain::Result<()> {
        self.repo.delete(id).await
    }
}
