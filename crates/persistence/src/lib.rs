//! Persistence layer for the Arena backend.
//!
//! This crate contains:
//! - Database connection management
//! - The generic soft-deletable document store and its backends
//! - Repository implementations layering domain invariants on the store

pub mod db;
pub mod repositories;
pub mod store;
