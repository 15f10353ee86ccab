//! Sync configuration.

use metasync_core::{validate_manifest_name, DEFAULT_MANIFEST_NAME};

use crate::error::Result;

/// Configuration for a [`SyncExecutor`](crate::SyncExecutor).
///
/// Passed explicitly at construction; the engine reads no global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Name of the manifest slot at the root of each synced tree.
    pub manifest_name: String,
    /// Upper bound on file transfers in flight at once.
    pub max_concurrent_transfers: usize,
    /// Remove empty directories from a local destination.
    pub prune_empty_dirs: bool,
    /// Take a local destination's stored manifest as its state instead of
    /// re-hashing the tree. Only safe when nothing edits the destination
    /// between runs.
    pub trust_local_manifest: bool,
}

impl SyncConfig {
    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Set the transfer concurrency. Zero is treated as one.
    pub fn with_max_concurrent_transfers(mut self, n: usize) -> Self {
        self.max_concurrent_transfers = n.max(1);
        self
    }

    /// Reject settings no run can honor. The manifest name must be a single
    /// file name so the slot is never walked as content.
    pub fn validate(&self) -> Result<()> {
        validate_manifest_name(&self.manifest_name)?;
        Ok(())
    }

    pub fn with_prune_empty_dirs(mut self, prune: bool) -> Self {
        self.prune_empty_dirs = prune;
        self
    }

    pub fn with_trust_local_manifest(mut self, trust: bool) -> Self {
        self.trust_local_manifest = trust;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            max_concurrent_transfers: 8,
            prune_empty_dirs: true,
            trust_local_manifest: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_nested_manifest_name_rejected() {
        let config = SyncConfig::default().with_manifest_name("state/slot");
        assert!(matches!(config.validate(), Err(SyncError::Core(_))));

        let config = SyncConfig::default().with_manifest_name("..");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_concurrency_floor() {
        let config = SyncConfig::default().with_max_concurrent_transfers(0);
        assert_eq!(config.max_concurrent_transfers, 1);
    }
}
