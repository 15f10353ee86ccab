//! Error types for the facade.

use metasync_core::CoreError;
use metasync_sync::SyncError;
use thiserror::Error;

/// Errors returned by [`Syncer`](crate::Syncer).
#[derive(Debug, Error)]
pub enum Error {
    /// An endpoint string could not be parsed.
    #[error(transparent)]
    Endpoint(#[from] CoreError),

    /// The sync run failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl Error {
    /// The underlying sync error, if the run got that far.
    pub fn as_sync(&self) -> Option<&SyncError> {
        match self {
            Error::Sync(e) => Some(e),
            Error::Endpoint(_) => None,
        }
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
