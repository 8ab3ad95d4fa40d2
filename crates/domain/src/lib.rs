//! Domain layer for the Arena backend.
//!
//! This crate contains:
//! - Domain models (Role, User) and their request/response types
//! - The role-hierarchy invariants and descendant-set algebra
//! - The core error type shared by repositories and services

pub mod error;
pub mod models;

pub use error::{Error, Result};
