//! The Syncer: string-endpoint API over the sync engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metasync_core::{ChangeSet, Manifest, SyncEndpoint};
use metasync_store::{FsStorage, StorageClient};
use metasync_sync::{ManifestBuilder, SyncConfig, SyncExecutor, SyncReport};
use tracing::debug;

use crate::error::Result;

/// Syncs folders given as endpoint strings.
///
/// An endpoint is either a local directory path or `container:prefix`
/// naming a location in the object store.
pub struct Syncer<S: StorageClient> {
    executor: SyncExecutor<S>,
}

impl Syncer<FsStorage> {
    /// A syncer whose object store is a directory on disk.
    pub fn with_store_root(root: impl Into<PathBuf>, config: SyncConfig) -> Self {
        Self::new(FsStorage::new(root), config)
    }
}

impl<S: StorageClient + 'static> Syncer<S> {
    pub fn new(storage: S, config: SyncConfig) -> Self {
        Self {
            executor: SyncExecutor::new(storage, config),
        }
    }

    pub fn with_shared(storage: Arc<S>, config: SyncConfig) -> Self {
        Self {
            executor: SyncExecutor::with_shared(storage, config),
        }
    }

    pub fn storage(&self) -> &S {
        self.executor.storage()
    }

    pub fn config(&self) -> &SyncConfig {
        self.executor.config()
    }

    /// Make `dest` match `source`.
    pub async fn sync(&self, source: &str, dest: &str) -> Result<SyncReport> {
        let (source, dest) = parse_pair(source, dest)?;
        Ok(self.executor.sync(&source, &dest).await?)
    }

    /// The changes [`sync`](Self::sync) would apply. Mutates nothing.
    pub async fn plan(&self, source: &str, dest: &str) -> Result<ChangeSet> {
        let (source, dest) = parse_pair(source, dest)?;
        Ok(self.executor.plan(&source, &dest).await?)
    }

    /// Hash a local tree into a manifest, skipping this syncer's slot.
    pub async fn manifest_of(&self, root: impl AsRef<Path>) -> Result<Manifest> {
        let builder = ManifestBuilder::new(root.as_ref(), self.config().manifest_name.clone());
        Ok(builder.build().await?)
    }
}

fn parse_pair(source: &str, dest: &str) -> Result<(SyncEndpoint, SyncEndpoint)> {
    let source = SyncEndpoint::parse(source)?;
    let dest = SyncEndpoint::parse(dest)?;
    debug!(%source, %dest, "parsed endpoints");
    Ok((source, dest))
}
