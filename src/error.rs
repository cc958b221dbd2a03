//! Error types for the registry.
//!
//! Missing-id lookups are not errors: the store treats them as silent no-ops
//! (see `apply_if_exists` in `store`). Errors here cover payload
//! serialization and the mirror write path.

use thiserror::Error;

/// Main error type for registry operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Mirror write failed: {0}")]
    MirrorWrite(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, StoreError>;
