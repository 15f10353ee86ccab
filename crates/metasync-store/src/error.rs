//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during object-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist.
    #[error("object not found: {container}:{key}")]
    NotFound { container: String, key: String },

    /// Container name or object key cannot be represented by the backend.
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure (network, auth, poisoned state).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(container: &str, key: &str) -> Self {
        StoreError::NotFound {
            container: container.to_string(),
            key: key.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
