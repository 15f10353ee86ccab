//! In-memory implementation of the StorageClient trait.
//!
//! This is primarily for testing. It has the same semantics as a real object
//! store but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::StorageClient;

/// In-memory object store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStorage {
    /// container -> (key -> bytes)
    inner: RwLock<HashMap<String, BTreeMap<String, Bytes>>>,
}

impl MemoryStorage {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects stored in a container.
    pub fn object_count(&self, container: &str) -> usize {
        self.read()
            .map(|inner| inner.get(container).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, BTreeMap<String, Bytes>>>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, BTreeMap<String, Bytes>>>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn get(&self, container: &str, key: &str) -> Result<Option<Bytes>> {
        let inner = self.read()?;
        Ok(inner.get(container).and_then(|objects| objects.get(key)).cloned())
    }

    async fn put(&self, container: &str, key: &str, data: Bytes) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("empty key".into()));
        }
        let mut inner = self.write()?;
        inner
            .entry(container.to_string())
            .or_default()
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, container: &str, key: &str) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(objects) = inner.get_mut(container) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>> {
        let inner = self.read()?;
        Ok(inner
            .get(container)
            .map(|objects| {
                objects
                    .range(prefix.to_string()..)
                    .take_while(|(key, _)| key.starts_with(prefix))
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
