//! A storage double that records every call and can inject failures.
//!
//! Wrap any [`StorageClient`] to assert exactly which object operations a
//! sync issued, e.g. that an up-to-date run only touches the manifest.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use metasync_store::{Result, StorageClient, StoreError};

/// One recorded storage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Get { container: String, key: String },
    Put { container: String, key: String },
    Delete { container: String, key: String },
    List { container: String, prefix: String },
}

impl StorageOp {
    /// The key (or list prefix) the call targeted.
    pub fn key(&self) -> &str {
        match self {
            StorageOp::Get { key, .. } | StorageOp::Put { key, .. } | StorageOp::Delete { key, .. } => {
                key
            }
            StorageOp::List { prefix, .. } => prefix,
        }
    }
}

/// Records calls to an inner storage client.
pub struct RecordingStorage<S> {
    inner: S,
    ops: Mutex<Vec<StorageOp>>,
    fail_keys: Mutex<Vec<String>>,
}

impl<S: StorageClient> RecordingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            ops: Mutex::new(Vec::new()),
            fail_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// All calls so far, in order.
    pub fn ops(&self) -> Vec<StorageOp> {
        self.ops.lock().expect("ops lock").clone()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.ops.lock().expect("ops lock").clear();
    }

    /// Keys written so far.
    pub fn puts(&self) -> Vec<String> {
        self.keys_where(|op| matches!(op, StorageOp::Put { .. }))
    }

    /// Keys deleted so far.
    pub fn deletes(&self) -> Vec<String> {
        self.keys_where(|op| matches!(op, StorageOp::Delete { .. }))
    }

    /// Keys read so far.
    pub fn gets(&self) -> Vec<String> {
        self.keys_where(|op| matches!(op, StorageOp::Get { .. }))
    }

    /// Make every later `put` or `delete` of `key` fail with a backend error.
    pub fn fail_writes_to(&self, key: impl Into<String>) {
        self.fail_keys.lock().expect("fail lock").push(key.into());
    }

    pub fn clear_failures(&self) {
        self.fail_keys.lock().expect("fail lock").clear();
    }

    fn keys_where(&self, pred: impl Fn(&StorageOp) -> bool) -> Vec<String> {
        self.ops
            .lock()
            .expect("ops lock")
            .iter()
            .filter(|op| pred(op))
            .map(|op| op.key().to_string())
            .collect()
    }

    fn record(&self, op: StorageOp) {
        self.ops.lock().expect("ops lock").push(op);
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if self.fail_keys.lock().expect("fail lock").iter().any(|k| k == key) {
            return Err(StoreError::Backend(format!("injected failure writing {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: StorageClient> StorageClient for RecordingStorage<S> {
    async fn get(&self, container: &str, key: &str) -> Result<Option<Bytes>> {
        self.record(StorageOp::Get {
            container: container.to_string(),
            key: key.to_string(),
        });
        self.inner.get(container, key).await
    }

    async fn put(&self, container: &str, key: &str, data: Bytes) -> Result<()> {
        self.record(StorageOp::Put {
            container: container.to_string(),
            key: key.to_string(),
        });
        self.check_write(key)?;
        self.inner.put(container, key, data).await
    }

    async fn delete(&self, container: &str, key: &str) -> Result<()> {
        self.record(StorageOp::Delete {
            container: container.to_string(),
            key: key.to_string(),
        });
        self.check_write(key)?;
        self.inner.delete(container, key).await
    }

    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>> {
        self.record(StorageOp::List {
            container: container.to_string(),
            prefix: prefix.to_string(),
        });
        self.inner.list(container, prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metasync_store::MemoryStorage;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let store = RecordingStorage::new(MemoryStorage::new());

        store.put("b", "k1", Bytes::from_static(b"v")).await.unwrap();
        store.get("b", "k1").await.unwrap();
        store.delete("b", "k1").await.unwrap();

        assert_eq!(store.puts(), vec!["k1".to_string()]);
        assert_eq!(store.gets(), vec!["k1".to_string()]);
        assert_eq!(store.deletes(), vec!["k1".to_string()]);
        assert_eq!(store.ops().len(), 3);

        store.clear();
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = RecordingStorage::new(MemoryStorage::new());
        store.fail_writes_to("bad");

        assert!(store.put("b", "bad", Bytes::new()).await.is_err());
        assert!(store.put("b", "good", Bytes::new()).await.is_ok());
        assert!(store.inner().get("b", "bad").await.unwrap().is_none());
    }
}
