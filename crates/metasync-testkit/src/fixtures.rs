//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use metasync_core::{Manifest, SyncEndpoint, DEFAULT_MANIFEST_NAME};
use tempfile::TempDir;

/// A local directory tree living in a temp dir, removed on drop.
///
/// The synced root is a subdirectory of the temp dir so tests can also
/// exercise syncing into a folder that does not exist yet.
pub struct TestTree {
    _dir: TempDir,
    root: PathBuf,
}

impl TestTree {
    /// Create an empty tree whose root directory exists.
    pub fn new() -> Self {
        let tree = Self::unborn();
        fs::create_dir_all(&tree.root).expect("create tree root");
        tree
    }

    /// Create a tree whose root directory has not been created.
    pub fn unborn() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().join("tree");
        Self { _dir: dir, root }
    }

    /// Create a tree with the given files.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let tree = Self::new();
        for (rel, content) in files {
            tree.write(rel, content);
        }
        tree
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// This tree as a sync endpoint.
    pub fn endpoint(&self) -> SyncEndpoint {
        SyncEndpoint::Local(self.root.clone())
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, content).expect("write file");
    }

    /// Read a file, or `None` if it does not exist.
    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.path(rel)).ok()
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("remove file");
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel)).expect("create dir");
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// All regular files below the root, `/`-separated and sorted.
    pub fn files(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.root.is_dir() {
            collect_files(&self.root, &self.root, &mut out);
        }
        out.sort();
        out
    }

    /// The manifest stored at the root under the default slot name.
    pub fn stored_manifest(&self) -> Option<Manifest> {
        self.read(DEFAULT_MANIFEST_NAME)
            .map(|text| Manifest::parse(&text).expect("stored manifest parses"))
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).expect("under root");
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push(parts.join("/"));
        }
    }
}
