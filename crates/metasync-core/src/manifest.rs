//! Manifests and their textual encoding.
//!
//! A manifest maps every relative file path of a synced tree to the content
//! hash of that file. It is stored in a reserved slot at the root of the tree
//! and encoded as a YAML mapping, one `path: hash` record per line, sorted by
//! path:
//!
//! ```text
//! foo/xxx: 0b6f0b3f0c1d...
//! zzz: 9a1e5c77d2b0...
//! ```
//!
//! The encoding is stable: the same manifest always produces the same bytes,
//! and `Manifest::parse(&m.to_text()?) == m` for every manifest.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{CoreError, ManifestParseError};
use crate::hash::ContentHash;
use crate::path::RelPath;

/// Default name of the manifest slot at the root of every synced tree.
pub const DEFAULT_MANIFEST_NAME: &str = ".meta-sync";

/// Check that `name` can serve as a manifest slot: a single plain file name
/// at the root of a tree.
pub fn validate_manifest_name(name: &str) -> Result<(), CoreError> {
    RelPath::new(name)?;
    if name.contains('/') {
        return Err(CoreError::InvalidPath {
            path: name.to_string(),
            reason: "manifest name must be a single path component",
        });
    }
    Ok(())
}

/// A snapshot of a tree: relative path to content hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<RelPath, ContentHash>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the hash for a path, returning the previous one if present.
    pub fn insert(&mut self, path: RelPath, hash: ContentHash) -> Option<ContentHash> {
        self.entries.insert(path, hash)
    }

    /// Remove a path.
    pub fn remove(&mut self, path: &str) -> Option<ContentHash> {
        self.entries.remove(path)
    }

    /// Look up the hash for a path.
    pub fn get(&self, path: &str) -> Option<&ContentHash> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&RelPath, &ContentHash)> {
        self.entries.iter()
    }

    /// Iterate paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &RelPath> {
        self.entries.keys()
    }

    /// Encode to the stored textual form.
    pub fn to_text(&self) -> Result<String, CoreError> {
        let records: BTreeMap<&str, String> = self
            .entries
            .iter()
            .map(|(path, hash)| (path.as_str(), hash.to_hex()))
            .collect();
        serde_yaml::to_string(&records).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Decode the stored textual form.
    ///
    /// Accepts an optional leading `---` document marker. Every key must be a
    /// valid relative path and every value a 64-character hex digest.
    pub fn parse(text: &str) -> Result<Self, ManifestParseError> {
        let body = text.trim();
        if body.is_empty() || body == "---" {
            return Err(ManifestParseError::Empty);
        }

        let records: BTreeMap<String, String> = serde_yaml::from_str(text)?;

        let mut manifest = Manifest::new();
        for (path, value) in records {
            let hash = ContentHash::from_hex(&value).map_err(|_| ManifestParseError::InvalidHash {
                path: path.clone(),
                value: value.clone(),
            })?;
            let rel = match RelPath::new(path) {
                Ok(rel) => rel,
                Err(CoreError::InvalidPath { path, reason }) => {
                    return Err(ManifestParseError::InvalidPath { path, reason })
                }
                Err(other) => return Err(ManifestParseError::Syntax(other.to_string())),
            };
            manifest.insert(rel, hash);
        }

        Ok(manifest)
    }

    /// Reject a manifest that lists the slot it is stored in.
    pub fn ensure_excludes(&self, slot: &str) -> Result<(), ManifestParseError> {
        if self.contains(slot) {
            return Err(ManifestParseError::ReservedEntry(slot.to_string()));
        }
        Ok(())
    }
}

impl FromStr for Manifest {
    type Err = ManifestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Manifest::parse(s)
    }
}

impl FromIterator<(RelPath, ContentHash)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (RelPath, ContentHash)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (&'a RelPath, &'a ContentHash);
    type IntoIter = std::collections::btree_map::Iter<'a, RelPath, ContentHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
