//! Repository implementations.
//!
//! Repositories wrap a generic store instance (composition, not
//! inheritance) and layer record-specific invariants on top of it.

pub mod role;
pub mod user;

pub use role::RoleRepository;
pub use user::UserRepository;
