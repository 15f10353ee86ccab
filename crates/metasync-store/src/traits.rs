//! StorageClient trait: the abstract interface to an object store.
//!
//! The sync engine only ever needs four object operations. Keeping the seam
//! this narrow lets tests substitute a deterministic in-memory store, and lets
//! real deployments plug in any transport (S3, GCS, a mounted directory).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};

/// Async get/put/delete/list against an object store.
///
/// Implementations own timeouts and retries; callers treat every error as
/// final for the current operation.
///
/// # Design Notes
///
/// - **Missing objects**: `get` returns `Ok(None)` rather than an error, so
///   callers can tell "no manifest yet" apart from a transport failure.
/// - **Idempotent deletes**: deleting a key that does not exist succeeds.
/// - **Flat keys**: keys are `/`-separated strings; there are no directories.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Fetch an object's bytes, or `None` if it does not exist.
    async fn get(&self, container: &str, key: &str) -> Result<Option<Bytes>>;

    /// Store an object, replacing any existing one.
    async fn put(&self, container: &str, key: &str, data: Bytes) -> Result<()>;

    /// Remove an object.
    async fn delete(&self, container: &str, key: &str) -> Result<()>;

    /// List all keys starting with `prefix`, in lexicographic order.
    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl<S: StorageClient + ?Sized> StorageClient for Arc<S> {
    async fn get(&self, container: &str, key: &str) -> Result<Option<Bytes>> {
        (**self).get(container, key).await
    }

    async fn put(&self, container: &str, key: &str, data: Bytes) -> Result<()> {
        (**self).put(container, key, data).await
    }

    async fn delete(&self, container: &str, key: &str) -> Result<()> {
        (**self).delete(container, key).await
    }

    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>> {
        (**self).list(container, prefix).await
    }
}

/// Extension trait for common storage patterns.
pub trait StorageExt: StorageClient {
    /// Fetch an object that must exist.
    fn get_required(
        &self,
        container: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Bytes>> + Send;

    /// Check whether an object exists.
    fn exists(
        &self,
        container: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl<S: StorageClient + ?Sized> StorageExt for S {
    async fn get_required(&self, container: &str, key: &str) -> Result<Bytes> {
        self.get(container, key)
            .await?
            .ok_or_else(|| StoreError::not_found(container, key))
    }

    async fn exists(&self, container: &str, key: &str) -> Result<bool> {
        Ok(self.get(container, key).await?.is_some())
    }
}
