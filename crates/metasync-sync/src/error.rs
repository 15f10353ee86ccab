//! Error types for the sync module.

use std::io;
use std::path::PathBuf;

use metasync_core::{CoreError, ManifestParseError};
use metasync_store::StoreError;
use thiserror::Error;

/// Errors that abort a sync run.
///
/// There is no partial-success outcome: any of these stops the run, and the
/// destination keeps its previous manifest until a later run commits.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source is remote and has no stored manifest. Syncing from it would
    /// look like an empty tree and delete everything at the destination.
    #[error("remote {container}:{prefix} has no manifest; refusing to sync from it")]
    RemoteWithoutMeta { container: String, prefix: String },

    /// A stored manifest exists but cannot be decoded.
    #[error("manifest error: {0}")]
    ManifestParse(#[from] ManifestParseError),

    /// Object-store operation failed.
    #[error("transport error: {0}")]
    Transport(#[from] StoreError),

    /// Local filesystem operation failed.
    #[error("local I/O error at {}: {source}", path.display())]
    LocalIo { path: PathBuf, source: io::Error },

    /// A local file name cannot be expressed as a manifest path, e.g. it
    /// contains a backslash or is not valid UTF-8.
    #[error("cannot sync {}: {source}", path.display())]
    UnsyncablePath { path: PathBuf, source: CoreError },

    /// Source and destination are both local or both remote.
    #[error("invalid endpoints: {0}")]
    InvalidEndpoints(String),

    /// Invalid path, hash, or endpoint value.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A transfer task panicked or was cancelled.
    #[error("transfer task failed: {0}")]
    TaskFailed(String),
}

impl SyncError {
    pub fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::LocalIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
