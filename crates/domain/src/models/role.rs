//! Role domain model and hierarchy rules.
//!
//! Roles form a shallow hierarchy: one distinguished root role whose
//! descendant set is kept as a superset of every other live role, a
//! distinguished player role that may never have descendants, and arbitrary
//! roles in between. Deletion is a soft status transition, never a physical
//! removal.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::{SortOrder, DEFAULT_LIMIT, DEFAULT_PAGE};
use uuid::Uuid;
use validator::Validate;

use crate::error::Error;

/// Reserved name of the hierarchy root.
pub const ROOT_ROLE_NAME: &str = "root";
/// Reserved name of the default administrative role.
pub const ADMIN_ROLE_NAME: &str = "admin";
/// Reserved name of the leaf role that may never have descendants.
pub const PLAYER_ROLE_NAME: &str = "player";

/// Marker inserted into a role's name on soft delete, freeing the original
/// name for reuse while keeping historical names distinguishable.
pub const DELETED_NAME_MARKER: &str = "__deleted__";

/// Roles whose name is immutable and which can never be deleted.
pub const PROTECTED_ROLE_NAMES: &[&str] = &[ROOT_ROLE_NAME, PLAYER_ROLE_NAME];

/// Whether a role name is protected (immutable, undeletable).
pub fn is_protected_name(name: &str) -> bool {
    PROTECTED_ROLE_NAMES.contains(&name)
}

/// Role lifecycle status. `Deleted` is a terminal soft-delete marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleStatus {
    #[default]
    Active,
    Inactive,
    Deleted,
}

impl RoleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleStatus::Active => "active",
            RoleStatus::Inactive => "inactive",
            RoleStatus::Deleted => "deleted",
        }
    }
}

/// A named node in the access hierarchy with a flat descendant set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub status: RoleStatus,
    #[serde(default)]
    pub descendants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    /// Builds a role ready for insertion. The store reassigns id and
    /// timestamps on create; the values set here are placeholders.
    pub fn new(name: impl Into<String>, status: RoleStatus, descendants: Vec<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status,
            descendants,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Input to role creation, already validated and trimmed at the edge.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub status: RoleStatus,
    pub descendants: Vec<Uuid>,
}

/// How an incoming descendant id set combines with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescendantsOperation {
    Add,
    Remove,
    Replace,
}

/// Applies a descendant-set operation to the current set.
///
/// The result is deduplicated and deterministically ordered, so repeating
/// the same `add` (or a `remove` disjoint from the current set) is a no-op.
pub fn apply_descendants_op(
    current: &[Uuid],
    incoming: &[Uuid],
    op: DescendantsOperation,
) -> Vec<Uuid> {
    let current: BTreeSet<Uuid> = current.iter().copied().collect();
    let incoming: BTreeSet<Uuid> = incoming.iter().copied().collect();

    let result: BTreeSet<Uuid> = match op {
        DescendantsOperation::Add => current.union(&incoming).copied().collect(),
        DescendantsOperation::Remove => current.difference(&incoming).copied().collect(),
        DescendantsOperation::Replace => incoming,
    };

    result.into_iter().collect()
}

/// The single authoritative check for hierarchy invariants shared by every
/// mutation path (create, update, seed):
///
/// - the player role may never have descendants
/// - no role may be a descendant of itself
pub fn check_hierarchy(name: &str, id: Option<Uuid>, descendants: &[Uuid]) -> Result<(), Error> {
    if name == PLAYER_ROLE_NAME && !descendants.is_empty() {
        return Err(Error::Validation(format!(
            "The \"{PLAYER_ROLE_NAME}\" role cannot have any descendants"
        )));
    }

    if let Some(id) = id {
        if descendants.contains(&id) {
            return Err(Error::Validation(
                "A role cannot be a descendant of itself".into(),
            ));
        }
    }

    Ok(())
}

/// A role seeded at first startup.
#[derive(Debug, Clone)]
pub struct DefaultRole {
    pub name: &'static str,
    pub status: RoleStatus,
    /// Names of the default roles this one owns as descendants, resolved to
    /// ids during the second seeding pass.
    pub descendants: &'static [&'static str],
}

/// The fixed default role set created on an empty store.
pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        name: ROOT_ROLE_NAME,
        status: RoleStatus::Active,
        descendants: &[ADMIN_ROLE_NAME, PLAYER_ROLE_NAME],
    },
    DefaultRole {
        name: ADMIN_ROLE_NAME,
        status: RoleStatus::Active,
        descendants: &[PLAYER_ROLE_NAME],
    },
    DefaultRole {
        name: PLAYER_ROLE_NAME,
        status: RoleStatus::Active,
        descendants: &[],
    },
];

/// Request to create a role.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,
    pub status: Option<RoleStatus>,
    pub descendants: Option<Vec<Uuid>>,
}

/// Request to update a role. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(max = 64, message = "Name must be at most 64 characters"))]
    pub name: Option<String>,
    pub status: Option<RoleStatus>,
    pub descendants: Option<Vec<Uuid>>,
    pub operation: Option<DescendantsOperation>,
}

/// Sortable fields for role listings (allow-list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoleSortBy {
    #[default]
    CreatedAt,
    Name,
    Status,
}

impl RoleSortBy {
    /// Stored field name this sort key maps to.
    pub fn field(&self) -> &'static str {
        match self {
            RoleSortBy::CreatedAt => "created_at",
            RoleSortBy::Name => "name",
            RoleSortBy::Status => "status",
        }
    }
}

/// Query parameters for listing roles.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListRolesQuery {
    /// Case-insensitive substring match on the role name.
    pub name: Option<String>,
    pub status: Option<RoleStatus>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be 1-100"))]
    pub limit: u32,
    #[serde(default)]
    pub sort_by: RoleSortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for ListRolesQuery {
    fn default() -> Self {
        Self {
            name: None,
            status: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: RoleSortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}
