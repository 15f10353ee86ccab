//! Directory-backed implementation of the StorageClient trait.
//!
//! Each container is a directory under the store root and each object a file
//! at its key path. Useful for local mirrors, mounted network shares, and the
//! command-line tool when no cloud transport is configured.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, StoreError};
use crate::traits::StorageClient;

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Open a store rooted at `root`. The directory is created lazily on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf> {
        if container.is_empty()
            || container == "."
            || container == ".."
            || container.contains(['/', '\\'])
        {
            return Err(StoreError::InvalidKey(format!("container {:?}", container)));
        }
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.container_dir(container)?;
        if key.is_empty() {
            return Err(StoreError::InvalidKey("empty key".into()));
        }
        for part in key.split('/') {
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => path.push(part),
                _ => return Err(StoreError::InvalidKey(key.to_string())),
            }
        }
        Ok(path)
    }

    /// Remove now-empty parent directories of a deleted object, stopping at
    /// the container directory.
    async fn remove_empty_parents(&self, container_dir: &Path, object: &Path) {
        let mut dir = object.parent();
        while let Some(current) = dir {
            if current == container_dir || !current.starts_with(container_dir) {
                break;
            }
            // Fails on non-empty directories, which ends the walk.
            if fs::remove_dir(current).await.is_err() {
                break;
            }
            dir = current.parent();
        }
    }
}

#[async_trait]
impl StorageClient for FsStorage {
    async fn get(&self, container: &str, key: &str) -> Result<Option<Bytes>> {
        let path = self.object_path(container, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, container: &str, key: &str, data: Bytes) -> Result<()> {
        let path = self.object_path(container, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file, then rename over the target.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));
        fs::write(&temp, &data).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(container, key, bytes = data.len(), "stored object");
        Ok(())
    }

    async fn delete(&self, container: &str, key: &str) -> Result<()> {
        let path = self.object_path(container, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        let container_dir = self.container_dir(container)?;
        self.remove_empty_parents(&container_dir, &path).await;
        Ok(())
    }

    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>> {
        let container_dir = self.container_dir(container)?;
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            if !container_dir.is_dir() {
                return Ok(Vec::new());
            }

            let mut keys = Vec::new();
            for entry in WalkDir::new(&container_dir).min_depth(1) {
                let entry = entry.map_err(|e| {
                    StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                        io::Error::new(io::ErrorKind::Other, "directory walk failed")
                    }))
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(&container_dir)
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&prefix) {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("list task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_storage_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path());

        store
            .put("bucket", "bar/foo/xxx", Bytes::from_static(b"yyy\n"))
            .await
            .unwrap();
        assert!(dir.path().join("bucket/bar/foo/xxx").is_file());

        let data = store.get("bucket", "bar/foo/xxx").await.unwrap().unwrap();
        assert_eq!(&data[..], b"yyy\n");

        store.delete("bucket", "bar/foo/xxx").await.unwrap();
        assert!(store.get("bucket", "bar/foo/xxx").await.unwrap().is_none());

        // Emptied key directories are cleaned up, the container stays.
        assert!(!dir.path().join("bucket/bar").exists());
        assert!(dir.path().join("bucket").is_dir());
    }

    #[tokio::test]
    async fn test_fs_storage_missing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path());

        assert!(store.get("bucket", "nope").await.unwrap().is_none());
        store.delete("bucket", "nope").await.unwrap();
        assert!(store.list("bucket", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_storage_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path());

        for key in ["bar/b", "bar/a/c", "baz/d"] {
            store.put("bucket", key, Bytes::from_static(b"x")).await.unwrap();
        }

        let keys = store.list("bucket", "bar/").await.unwrap();
        assert_eq!(keys, vec!["bar/a/c".to_string(), "bar/b".to_string()]);
    }

    #[tokio::test]
    async fn test_fs_storage_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path());

        for key in ["../x", "a/../../x", "a//b", ""] {
            let err = store
                .put("bucket", key, Bytes::from_static(b"x"))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "{key}");
        }
        assert!(store.get("..", "x").await.is_err());
    }
}
