//! Domain models for the Arena backend.

pub mod role;
pub mod user;

pub use role::{
    apply_descendants_op, check_hierarchy, is_protected_name, CreateRoleRequest, DefaultRole,
    DescendantsOperation, ListRolesQuery, NewRole, Role, RoleSortBy, RoleStatus,
    UpdateRoleRequest, DEFAULT_ROLES, PLAYER_ROLE_NAME, ROOT_ROLE_NAME,
};
pub use user::{LoginRequest, LoginResponse, NewUser, User, UserResponse, UserStatus};
