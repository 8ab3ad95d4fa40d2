pub mod auth;
pub mod bootstrap;
pub mod roles;

pub use auth::AuthService;
pub use roles::RoleService;
