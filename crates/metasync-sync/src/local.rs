//! Local filesystem operations for a destination tree.

use std::io;
use std::path::{Path, PathBuf};

use metasync_core::Manifest;
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SyncError};

/// Read a tree's stored manifest. Returns `None` if the slot does not exist.
pub async fn read_manifest(root: &Path, manifest_name: &str) -> Result<Option<Manifest>> {
    let path = root.join(manifest_name);
    let text = match fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::local_io(path, e)),
    };

    let manifest = Manifest::parse(&text)?;
    manifest.ensure_excludes(manifest_name)?;
    Ok(Some(manifest))
}

/// Write a file by writing a sibling temp file and renaming it into place.
///
/// Parent directories are created as needed, and an empty directory already
/// sitting at `path` is replaced. A reader never observes a half-written file
/// at `path`.
pub async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| SyncError::local_io(parent, e))?;
    }

    // Left behind when a directory became a file and pruning is off.
    if let Ok(meta) = fs::symlink_metadata(path).await {
        if meta.is_dir() {
            fs::remove_dir(path)
                .await
                .map_err(|e| SyncError::local_io(path, e))?;
            debug!(path = %path.display(), "replaced empty directory");
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

    fs::write(&temp, data)
        .await
        .map_err(|e| SyncError::local_io(&temp, e))?;

    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(SyncError::local_io(path, e));
    }
    Ok(())
}

/// Remove a file. A file that is already gone is not an error.
pub async fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "file already missing");
            Ok(false)
        }
        Err(e) => Err(SyncError::local_io(path, e)),
    }
}

/// Remove every empty directory below `root`, deepest first, so parents
/// emptied by removing their children go in the same pass. `root` itself is
/// kept.
///
/// Returns the removed directories relative to `root`.
pub async fn prune_empty_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || prune_empty_dirs_blocking(&root))
        .await
        .map_err(|e| SyncError::TaskFailed(format!("prune: {}", e)))?
}

fn prune_empty_dirs_blocking(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"));
            SyncError::local_io(path, source)
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let is_empty = std::fs::read_dir(path)
            .map_err(|e| SyncError::local_io(path, e))?
            .next()
            .is_none();

        if is_empty {
            std::fs::remove_dir(path).map_err(|e| SyncError::local_io(path, e))?;
            debug!(dir = %path.display(), "pruned empty directory");
            removed.push(path.strip_prefix(root).unwrap_or(path).to_path_buf());
        }
    }

    Ok(removed)
}
