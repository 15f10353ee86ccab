//! Error types for metasync core.

use thiserror::Error;

/// Errors raised while constructing core values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid relative path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid content hash: {0:?}")]
    InvalidHash(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Errors raised when a stored manifest cannot be decoded.
///
/// A destination manifest that exists but fails to parse aborts the sync:
/// guessing its contents could turn into a delete-everything change set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestParseError {
    #[error("manifest is empty")]
    Empty,

    #[error("malformed manifest: {0}")]
    Syntax(String),

    #[error("manifest entry {path:?} has an invalid path: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("manifest entry {path:?} has an invalid hash {value:?}")]
    InvalidHash { path: String, value: String },

    #[error("manifest lists its own slot {0:?} as content")]
    ReservedEntry(String),
}

impl From<serde_yaml::Error> for ManifestParseError {
    fn from(e: serde_yaml::Error) -> Self {
        ManifestParseError::Syntax(e.to_string())
    }
}
