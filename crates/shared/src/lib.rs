//! Shared utilities and common types for the Arena backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Offset/limit pagination types
//! - Password hashing with Argon2id
//! - JWT token utilities

pub mod jwt;
pub mod pagination;
pub mod password;
