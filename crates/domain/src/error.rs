//! Core error type surfaced by repositories and services.
//!
//! Failures are returned immediately to the caller, never retried, and carry
//! enough detail to reconstruct which rule fired (including the full list of
//! implicated ids or names). Partial effects of multi-step operations are not
//! rolled back; that limitation is documented on the operations themselves.

use thiserror::Error;

/// Error kinds surfaced by the core.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied data violates a core rule. Always detectable before
    /// any write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness or protection invariant would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced id does not resolve to a non-deleted record.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The underlying store failed; propagated as-is, retry is the caller's
    /// decision.
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::Validation("bad input".into()).to_string(),
            "Validation error: bad input"
        );
        assert_eq!(
            Error::Conflict("duplicate".into()).to_string(),
            "Conflict: duplicate"
        );
        assert_eq!(
            Error::NotFound("role x".into()).to_string(),
            "Not found: role x"
        );
    }
}
