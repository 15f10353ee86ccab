//! Manifest construction from a local directory tree.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use metasync_core::{ContentHash, Manifest, RelPath};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SyncError};

/// Walks a local tree and hashes every regular file.
///
/// The manifest slot at the root is skipped; a file with the same name deeper
/// in the tree is ordinary content. Symlinks are not followed and are not
/// part of the manifest. A file whose name cannot be a manifest path (a
/// backslash, or not UTF-8) fails the build with
/// [`SyncError::UnsyncablePath`]; unreadable files fail with
/// [`SyncError::LocalIo`].
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    root: PathBuf,
    manifest_name: String,
}

impl ManifestBuilder {
    pub fn new(root: impl Into<PathBuf>, manifest_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            manifest_name: manifest_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the manifest on a blocking thread.
    pub async fn build(&self) -> Result<Manifest> {
        let builder = self.clone();
        tokio::task::spawn_blocking(move || builder.build_blocking())
            .await
            .map_err(|e| SyncError::TaskFailed(format!("manifest build: {}", e)))?
    }

    /// Build the manifest on the current thread.
    pub fn build_blocking(&self) -> Result<Manifest> {
        let meta =
            std::fs::metadata(&self.root).map_err(|e| SyncError::local_io(&self.root, e))?;
        if !meta.is_dir() {
            return Err(SyncError::local_io(
                &self.root,
                io::Error::new(io::ErrorKind::Other, "not a directory"),
            ));
        }

        let mut manifest = Manifest::new();

        for entry in WalkDir::new(&self.root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                let source = e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "filesystem loop detected")
                });
                SyncError::local_io(path, source)
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            if entry.depth() == 1 && entry.file_name() == self.manifest_name.as_str() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            let rel = RelPath::from_relative_path(relative).map_err(|source| {
                SyncError::UnsyncablePath {
                    path: entry.path().to_path_buf(),
                    source,
                }
            })?;

            let file = File::open(entry.path()).map_err(|e| SyncError::local_io(entry.path(), e))?;
            let hash =
                ContentHash::from_reader(file).map_err(|e| SyncError::local_io(entry.path(), e))?;

            manifest.insert(rel, hash);
        }

        debug!(root = %self.root.display(), files = manifest.len(), "built manifest");
        Ok(manifest)
    }
}
