//! Sync executor state machine.
//!
//! One run moves through fixed phases:
//!
//! ```text
//! Start -> GuardChecked -> ManifestsLoaded -> Diffed -> Applying -> Committed
//!   \__________\_______________\_______________\_________\______> Aborted
//! ```
//!
//! The manifest commit is the last step and the only one that marks the
//! destination as caught up. A run that dies earlier leaves the old manifest
//! in place, and the next run recomputes the diff from scratch.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use metasync_core::{diff, ChangeSet, Manifest, RelPath, RemoteLocation, SyncEndpoint};
use metasync_store::{StorageClient, StorageExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::builder::ManifestBuilder;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::local;

/// Phases of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Start,
    GuardChecked,
    ManifestsLoaded,
    Diffed,
    Applying,
    Committed,
    Aborted,
}

impl SyncPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncPhase::Committed | SyncPhase::Aborted)
    }
}

/// Which way files flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local source, remote destination.
    Upload,
    /// Remote source, local destination.
    Download,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Upload => f.write_str("upload"),
            SyncDirection::Download => f.write_str("download"),
        }
    }
}

/// Result of a successful sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub direction: SyncDirection,
    /// Paths copied from source to destination.
    pub transferred: Vec<RelPath>,
    /// Paths removed from the destination.
    pub deleted: Vec<RelPath>,
    /// Empty directories removed from a local destination, relative to its root.
    pub pruned_dirs: Vec<PathBuf>,
    /// Source files that were already up to date.
    pub unchanged: usize,
    /// Payload bytes copied.
    pub bytes_transferred: u64,
}

impl SyncReport {
    /// True when the run changed no content files.
    pub fn is_noop(&self) -> bool {
        self.transferred.is_empty() && self.deleted.is_empty()
    }
}

/// The two sides of a run, resolved from endpoints.
#[derive(Debug, Clone)]
enum Route {
    Upload { local: PathBuf, remote: RemoteLocation },
    Download { remote: RemoteLocation, local: PathBuf },
}

impl Route {
    fn resolve(source: &SyncEndpoint, dest: &SyncEndpoint) -> Result<Self> {
        match (source, dest) {
            (SyncEndpoint::Local(local), SyncEndpoint::Remote(remote)) => Ok(Route::Upload {
                local: local.clone(),
                remote: remote.clone(),
            }),
            (SyncEndpoint::Remote(remote), SyncEndpoint::Local(local)) => Ok(Route::Download {
                remote: remote.clone(),
                local: local.clone(),
            }),
            (SyncEndpoint::Local(_), SyncEndpoint::Local(_)) => Err(SyncError::InvalidEndpoints(
                format!("both {} and {} are local", source, dest),
            )),
            (SyncEndpoint::Remote(_), SyncEndpoint::Remote(_)) => Err(SyncError::InvalidEndpoints(
                format!("both {} and {} are remote", source, dest),
            )),
        }
    }

    fn direction(&self) -> SyncDirection {
        match self {
            Route::Upload { .. } => SyncDirection::Upload,
            Route::Download { .. } => SyncDirection::Download,
        }
    }
}

/// Tracks and logs the phase of one run.
struct PhaseTracker {
    phase: SyncPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: SyncPhase::Start,
        }
    }

    fn advance(&mut self, next: SyncPhase) {
        debug_assert!(!self.phase.is_terminal(), "advance past {:?}", self.phase);
        debug!(from = ?self.phase, to = ?next, "sync phase");
        self.phase = next;
    }

    fn abort(&mut self, error: &SyncError) {
        warn!(phase = ?self.phase, %error, "sync aborted");
        self.phase = SyncPhase::Aborted;
    }
}

/// Everything computed before the first mutation.
struct Plan {
    route: Route,
    source: Manifest,
    changes: ChangeSet,
}

/// Reconciles a destination with a source through a [`StorageClient`].
pub struct SyncExecutor<S: StorageClient> {
    storage: Arc<S>,
    config: SyncConfig,
}

impl<S: StorageClient + 'static> SyncExecutor<S> {
    /// Create an executor owning its storage client.
    pub fn new(storage: S, config: SyncConfig) -> Self {
        Self::with_shared(Arc::new(storage), config)
    }

    /// Create an executor sharing a storage client.
    pub fn with_shared(storage: Arc<S>, config: SyncConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run a full sync from `source` to `dest`.
    pub async fn sync(&self, source: &SyncEndpoint, dest: &SyncEndpoint) -> Result<SyncReport> {
        let mut tracker = PhaseTracker::new();
        match self.run(&mut tracker, source, dest).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracker.abort(&e);
                Err(e)
            }
        }
    }

    /// Compute the change set a sync would apply, without applying it.
    ///
    /// The remote-source guard applies here too.
    pub async fn plan(&self, source: &SyncEndpoint, dest: &SyncEndpoint) -> Result<ChangeSet> {
        let mut tracker = PhaseTracker::new();
        match self.prepare(&mut tracker, source, dest).await {
            Ok(plan) => Ok(plan.changes),
            Err(e) => {
                tracker.abort(&e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        tracker: &mut PhaseTracker,
        source: &SyncEndpoint,
        dest: &SyncEndpoint,
    ) -> Result<SyncReport> {
        let plan = self.prepare(tracker, source, dest).await?;

        info!(
            direction = %plan.route.direction(),
            source = %source,
            dest = %dest,
            changes = %plan.changes,
            "applying changes"
        );
        tracker.advance(SyncPhase::Applying);
        let mut report = self.apply(&plan).await?;

        self.commit(&plan.route, &plan.source).await?;
        tracker.advance(SyncPhase::Committed);

        report.unchanged = plan.source.len() - plan.changes.transfer.len();
        info!(
            transferred = report.transferred.len(),
            deleted = report.deleted.len(),
            pruned = report.pruned_dirs.len(),
            unchanged = report.unchanged,
            bytes = report.bytes_transferred,
            "sync committed"
        );
        Ok(report)
    }

    /// Start through Diffed. Performs no mutation.
    async fn prepare(
        &self,
        tracker: &mut PhaseTracker,
        source: &SyncEndpoint,
        dest: &SyncEndpoint,
    ) -> Result<Plan> {
        self.config.validate()?;
        let route = Route::resolve(source, dest)?;

        // Guard: a remote source without a manifest would diff as an empty
        // tree and wipe the destination.
        let remote_source_manifest = match &route {
            Route::Download { remote, .. } => match self.fetch_remote_manifest(remote).await? {
                Some(manifest) => Some(manifest),
                None => {
                    return Err(SyncError::RemoteWithoutMeta {
                        container: remote.container.clone(),
                        prefix: remote.prefix.clone(),
                    })
                }
            },
            Route::Upload { .. } => None,
        };
        tracker.advance(SyncPhase::GuardChecked);

        let (source_manifest, dest_manifest) = match &route {
            Route::Upload { local, remote } => {
                let source = self.builder(local).build().await?;
                let dest = self.fetch_remote_manifest(remote).await?.unwrap_or_default();
                (source, dest)
            }
            Route::Download { local, .. } => {
                let source = remote_source_manifest.unwrap_or_default();
                let dest = self.local_dest_manifest(local).await?;
                (source, dest)
            }
        };
        tracker.advance(SyncPhase::ManifestsLoaded);

        let changes = diff(&source_manifest, &dest_manifest);
        tracker.advance(SyncPhase::Diffed);
        debug!(
            source_files = source_manifest.len(),
            dest_files = dest_manifest.len(),
            %changes,
            "diffed manifests"
        );

        Ok(Plan {
            route,
            source: source_manifest,
            changes,
        })
    }

    fn builder(&self, root: &Path) -> ManifestBuilder {
        ManifestBuilder::new(root, self.config.manifest_name.clone())
    }

    async fn fetch_remote_manifest(&self, remote: &RemoteLocation) -> Result<Option<Manifest>> {
        let key = remote.key_for(&self.config.manifest_name);
        let Some(data) = self.storage.get(&remote.container, &key).await? else {
            return Ok(None);
        };

        let text = String::from_utf8(data.to_vec()).map_err(|_| {
            metasync_core::ManifestParseError::Syntax(format!("{} is not UTF-8", key))
        })?;
        let manifest = Manifest::parse(&text)?;
        manifest.ensure_excludes(&self.config.manifest_name)?;
        Ok(Some(manifest))
    }

    /// State of a local destination: re-hashed by default, the stored
    /// manifest when configured to trust it.
    async fn local_dest_manifest(&self, root: &Path) -> Result<Manifest> {
        if self.config.trust_local_manifest {
            if let Some(stored) = local::read_manifest(root, &self.config.manifest_name).await? {
                return Ok(stored);
            }
        }
        if !root.exists() {
            return Ok(Manifest::new());
        }
        self.builder(root).build().await
    }

    async fn apply(&self, plan: &Plan) -> Result<SyncReport> {
        let mut report = SyncReport {
            direction: plan.route.direction(),
            transferred: Vec::new(),
            deleted: Vec::new(),
            pruned_dirs: Vec::new(),
            unchanged: 0,
            bytes_transferred: 0,
        };

        // Deletions go first so a path that changed between file and
        // directory is free before its replacement is written.
        for path in &plan.changes.delete {
            match &plan.route {
                Route::Upload { remote, .. } => {
                    self.storage
                        .delete(&remote.container, &remote.key_for(path.as_str()))
                        .await?;
                }
                Route::Download { local, .. } => {
                    local::remove_file(&path.to_native(local)).await?;
                }
            }
            debug!(path = %path, "deleted");
            report.deleted.push(path.clone());
        }

        if let Route::Download { local, .. } = &plan.route {
            if self.config.prune_empty_dirs {
                report.pruned_dirs = local::prune_empty_dirs(local).await?;
            }
        }

        report.bytes_transferred = match &plan.route {
            Route::Upload { local, remote } => {
                self.upload_all(local, remote, &plan.changes.transfer).await?
            }
            Route::Download { remote, local } => {
                self.download_all(remote, local, &plan.changes.transfer).await?
            }
        };
        report.transferred = plan.changes.transfer.iter().cloned().collect();

        Ok(report)
    }

    async fn upload_all(
        &self,
        local: &Path,
        remote: &RemoteLocation,
        paths: &BTreeSet<RelPath>,
    ) -> Result<u64> {
        let storage = Arc::clone(&self.storage);
        let local = local.to_path_buf();
        let remote = remote.clone();

        self.run_bounded(paths, move |path| {
            let storage = Arc::clone(&storage);
            let remote = remote.clone();
            let file = path.to_native(&local);
            async move {
                let data = tokio::fs::read(&file)
                    .await
                    .map_err(|e| SyncError::local_io(&file, e))?;
                let len = data.len() as u64;
                storage
                    .put(&remote.container, &remote.key_for(path.as_str()), Bytes::from(data))
                    .await?;
                debug!(path = %path, bytes = len, "uploaded");
                Ok::<u64, SyncError>(len)
            }
        })
        .await
    }

    async fn download_all(
        &self,
        remote: &RemoteLocation,
        local: &Path,
        paths: &BTreeSet<RelPath>,
    ) -> Result<u64> {
        let storage = Arc::clone(&self.storage);
        let local = local.to_path_buf();
        let remote = remote.clone();

        self.run_bounded(paths, move |path| {
            let storage = Arc::clone(&storage);
            let remote = remote.clone();
            let file = path.to_native(&local);
            async move {
                let data = storage
                    .get_required(&remote.container, &remote.key_for(path.as_str()))
                    .await?;
                local::write_atomic(&file, &data).await?;
                debug!(path = %path, bytes = data.len(), "downloaded");
                Ok::<u64, SyncError>(data.len() as u64)
            }
        })
        .await
    }

    /// Run one task per path with at most `max_concurrent_transfers` in
    /// flight. The first failure cancels the rest and is returned.
    async fn run_bounded<F, Fut>(&self, paths: &BTreeSet<RelPath>, task: F) -> Result<u64>
    where
        F: Fn(RelPath) -> Fut,
        Fut: Future<Output = Result<u64>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_transfers.max(1)));
        let mut join_set = JoinSet::new();

        for path in paths {
            let semaphore = Arc::clone(&semaphore);
            let fut = task(path.clone());
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SyncError::TaskFailed(e.to_string()))?;
                fut.await
            });
        }

        let mut total = 0u64;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(bytes)) => total += bytes,
                Ok(Err(e)) => {
                    join_set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    join_set.abort_all();
                    return Err(SyncError::TaskFailed(e.to_string()));
                }
            }
        }
        Ok(total)
    }

    /// Write the source manifest into the destination's slot.
    async fn commit(&self, route: &Route, source: &Manifest) -> Result<()> {
        let text = source.to_text()?;
        match route {
            Route::Upload { remote, .. } => {
                let key = remote.key_for(&self.config.manifest_name);
                self.storage
                    .put(&remote.container, &key, Bytes::from(text))
                    .await?;
            }
            Route::Download { local, .. } => {
                local::write_atomic(&local.join(&self.config.manifest_name), text.as_bytes())
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metasync_core::ContentHash;
    use metasync_store::MemoryStorage;
    use std::fs;

    fn remote(prefix: &str) -> SyncEndpoint {
        SyncEndpoint::Remote(RemoteLocation::new("bucket", prefix))
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn executor() -> SyncExecutor<MemoryStorage> {
        SyncExecutor::new(MemoryStorage::new(), SyncConfig::default())
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let exec = executor();
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write(a.path(), "xxx", "yyy\n");

        let up = exec
            .sync(&SyncEndpoint::Local(a.path().into()), &remote("bar"))
            .await
            .unwrap();
        assert_eq!(up.direction, SyncDirection::Upload);
        assert_eq!(up.transferred.len(), 1);
        assert_eq!(up.bytes_transferred, 4);

        let stored = exec.storage().get("bucket", "bar/xxx").await.unwrap().unwrap();
        assert_eq!(&stored[..], b"yyy\n");

        let dest = b.path().join("fresh");
        let down = exec
            .sync(&remote("bar"), &SyncEndpoint::Local(dest.clone()))
            .await
            .unwrap();
        assert_eq!(down.direction, SyncDirection::Download);
        assert_eq!(fs::read_to_string(dest.join("xxx")).unwrap(), "yyy\n");
    }

    #[tokio::test]
    async fn test_plan_does_not_mutate() {
        let exec = executor();
        let a = tempfile::tempdir().unwrap();
        write(a.path(), "xxx", "yyy\n");

        let changes = exec
            .plan(&SyncEndpoint::Local(a.path().into()), &remote("bar"))
            .await
            .unwrap();
        assert_eq!(changes.transfer.len(), 1);
        assert_eq!(exec.storage().object_count("bucket"), 0);
    }

    #[tokio::test]
    async fn test_guard_rejects_remote_without_manifest() {
        let exec = executor();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("never-created");

        let err = exec
            .sync(&remote("baz"), &SyncEndpoint::Local(dest.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::RemoteWithoutMeta { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_rejects_same_kind_endpoints() {
        let exec = executor();
        let err = exec.sync(&remote("a"), &remote("b")).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidEndpoints(_)));

        let local = SyncEndpoint::Local(PathBuf::from("x"));
        let err = exec.sync(&local, &local).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidEndpoints(_)));
    }

    #[tokio::test]
    async fn test_corrupt_destination_manifest_aborts() {
        let exec = executor();
        exec.storage()
            .put("bucket", "bar/.meta-sync", Bytes::from_static(b"- not\n- a map\n"))
            .await
            .unwrap();

        let a = tempfile::tempdir().unwrap();
        write(a.path(), "xxx", "yyy\n");

        let err = exec
            .sync(&SyncEndpoint::Local(a.path().into()), &remote("bar"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ManifestParse(_)));
        assert!(exec.storage().get("bucket", "bar/xxx").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_source_object_is_transport_error() {
        let exec = executor();
        let manifest: Manifest = [(RelPath::new("ghost").unwrap(), ContentHash::of(b"boo"))]
            .into_iter()
            .collect();
        exec.storage()
            .put("bucket", "bar/.meta-sync", Bytes::from(manifest.to_text().unwrap()))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = exec
            .sync(&remote("bar"), &SyncEndpoint::Local(dir.path().into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        // Not committed.
        assert!(!dir.path().join(".meta-sync").exists());
    }

    #[tokio::test]
    async fn test_file_replaced_by_directory() {
        let exec = executor();
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();

        write(a.path(), "node", "file\n");
        exec.sync(&SyncEndpoint::Local(a.path().into()), &remote("p"))
            .await
            .unwrap();
        exec.sync(&remote("p"), &SyncEndpoint::Local(b.path().into()))
            .await
            .unwrap();

        fs::remove_file(a.path().join("node")).unwrap();
        write(a.path(), "node/child", "nested\n");
        exec.sync(&SyncEndpoint::Local(a.path().into()), &remote("p"))
            .await
            .unwrap();
        exec.sync(&remote("p"), &SyncEndpoint::Local(b.path().into()))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(b.path().join("node/child")).unwrap(), "nested\n");
    }

    #[tokio::test]
    async fn test_directory_replaced_by_file_without_pruning() {
        let storage = Arc::new(MemoryStorage::new());
        let exec = SyncExecutor::with_shared(
            Arc::clone(&storage),
            SyncConfig::default().with_prune_empty_dirs(false),
        );
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();

        write(a.path(), "node/child", "nested\n");
        exec.sync(&SyncEndpoint::Local(a.path().into()), &remote("p"))
            .await
            .unwrap();
        exec.sync(&remote("p"), &SyncEndpoint::Local(b.path().into()))
            .await
            .unwrap();

        fs::remove_dir_all(a.path().join("node")).unwrap();
        write(a.path(), "node", "file\n");
        exec.sync(&SyncEndpoint::Local(a.path().into()), &remote("p"))
            .await
            .unwrap();
        let report = exec
            .sync(&remote("p"), &SyncEndpoint::Local(b.path().into()))
            .await
            .unwrap();

        assert!(report.pruned_dirs.is_empty());
        assert_eq!(fs::read_to_string(b.path().join("node")).unwrap(), "file\n");
    }

    #[tokio::test]
    async fn test_nested_manifest_name_fails_before_any_mutation() {
        let storage = Arc::new(MemoryStorage::new());
        let exec = SyncExecutor::with_shared(
            Arc::clone(&storage),
            SyncConfig::default().with_manifest_name("state/slot"),
        );
        let a = tempfile::tempdir().unwrap();
        write(a.path(), "xxx", "yyy\n");

        let local = SyncEndpoint::Local(a.path().into());
        let err = exec.sync(&local, &remote("www")).await.unwrap_err();
        assert!(matches!(err, SyncError::Core(_)));
        assert!(exec.plan(&local, &remote("www")).await.is_err());
        assert_eq!(storage.object_count("bucket"), 0);
    }

    #[test]
    fn test_phase_tracker_ends_terminal() {
        let mut tracker = PhaseTracker::new();
        assert!(!tracker.phase.is_terminal());

        tracker.advance(SyncPhase::GuardChecked);
        assert!(!tracker.phase.is_terminal());

        tracker.abort(&SyncError::TaskFailed("boom".into()));
        assert_eq!(tracker.phase, SyncPhase::Aborted);
        assert!(tracker.phase.is_terminal());
    }

    #[tokio::test]
    async fn test_trust_local_manifest_skips_rehash() {
        let storage = Arc::new(MemoryStorage::new());
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write(a.path(), "xxx", "yyy\n");

        let exec = SyncExecutor::with_shared(Arc::clone(&storage), SyncConfig::default());
        exec.sync(&SyncEndpoint::Local(a.path().into()), &remote("bar"))
            .await
            .unwrap();
        exec.sync(&remote("bar"), &SyncEndpoint::Local(b.path().into()))
            .await
            .unwrap();

        // An edit the stored manifest does not know about survives when the
        // local manifest is trusted...
        write(b.path(), "xxx", "fff\n");
        let trusting = SyncExecutor::with_shared(
            Arc::clone(&storage),
            SyncConfig::default().with_trust_local_manifest(true),
        );
        let report = trusting
            .sync(&remote("bar"), &SyncEndpoint::Local(b.path().into()))
            .await
            .unwrap();
        assert!(report.is_noop());
        assert_eq!(fs::read_to_string(b.path().join("xxx")).unwrap(), "fff\n");

        // ...and is overwritten by the default re-hashing executor.
        let report = exec
            .sync(&remote("bar"), &SyncEndpoint::Local(b.path().into()))
            .await
            .unwrap();
        assert_eq!(report.transferred.len(), 1);
        assert_eq!(fs::read_to_string(b.path().join("xxx")).unwrap(), "yyy\n");
    }

    #[tokio::test]
    async fn test_many_files_with_low_concurrency() {
        let exec = SyncExecutor::new(
            MemoryStorage::new(),
            SyncConfig::default().with_max_concurrent_transfers(2),
        );
        let a = tempfile::tempdir().unwrap();
        for i in 0..25 {
            write(a.path(), &format!("dir{}/file{}", i % 3, i), &format!("content {}\n", i));
        }

        let report = exec
            .sync(&SyncEndpoint::Local(a.path().into()), &remote(""))
            .await
            .unwrap();

        assert_eq!(report.transferred.len(), 25);
        // 25 files plus the manifest at the container root.
        assert_eq!(exec.storage().object_count("bucket"), 26);
        assert!(exec.storage().get("bucket", ".meta-sync").await.unwrap().is_some());
    }
}
