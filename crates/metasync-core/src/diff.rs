//! Manifest diffing.
//!
//! Compares a source manifest against a destination manifest. Hash equality
//! is the only notion of "up to date". `diff` works on manifests alone and
//! never reads either tree; producing the manifests is the caller's job.

use std::collections::BTreeSet;
use std::fmt;

use crate::manifest::Manifest;
use crate::path::RelPath;

/// The file operations needed to bring a destination in line with a source.
///
/// `transfer` and `delete` never share a path. Computed per run, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Paths whose source content must be copied to the destination.
    pub transfer: BTreeSet<RelPath>,
    /// Paths that must be removed from the destination.
    pub delete: BTreeSet<RelPath>,
}

impl ChangeSet {
    /// True when nothing needs to be transferred or deleted.
    pub fn is_empty(&self) -> bool {
        self.transfer.is_empty() && self.delete.is_empty()
    }

    /// Total number of file operations.
    pub fn len(&self) -> usize {
        self.transfer.len() + self.delete.len()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to transfer, {} to delete",
            self.transfer.len(),
            self.delete.len()
        )
    }
}

/// Compute the minimal change set turning `dest` into `source`.
///
/// - a source path missing from `dest`, or present with a different hash,
///   is transferred;
/// - a `dest` path missing from the source is deleted;
/// - a path with an identical hash on both sides is left alone.
pub fn diff(source: &Manifest, dest: &Manifest) -> ChangeSet {
    let transfer = source
        .iter()
        .filter(|(path, hash)| dest.get(path.as_str()) != Some(*hash))
        .map(|(path, _)| path.clone())
        .collect();

    let delete = dest
        .paths()
        .filter(|path| !source.contains(path.as_str()))
        .cloned()
        .collect();

    ChangeSet { transfer, delete }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ContentHash;
    use proptest::prelude::*;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        entries
            .iter()
            .map(|(p, c)| (RelPath::new(*p).unwrap(), ContentHash::of(c.as_bytes())))
            .collect()
    }

    fn paths(set: &BTreeSet<RelPath>) -> Vec<&str> {
        set.iter().map(RelPath::as_str).collect()
    }

    #[test]
    fn test_first_sync_transfers_everything() {
        let source = manifest(&[("xxx", "yyy\n"), ("foo/zzz", "z")]);
        let changes = diff(&source, &Manifest::new());

        assert_eq!(paths(&changes.transfer), vec!["foo/zzz", "xxx"]);
        assert!(changes.delete.is_empty());
    }

    #[test]
    fn test_identical_manifests_are_a_noop() {
        let source = manifest(&[("xxx", "yyy\n")]);
        let changes = diff(&source, &source.clone());
        assert!(changes.is_empty());
        assert_eq!(changes.len(), 0);
    }

    #[test]
    fn test_changed_added_and_removed() {
        let source = manifest(&[("keep", "same"), ("edit", "new"), ("foo/zzz", "yyy\n")]);
        let dest = manifest(&[("keep", "same"), ("edit", "old"), ("foo/xxx", "yyy\n")]);

        let changes = diff(&source, &dest);

        assert_eq!(paths(&changes.transfer), vec!["edit", "foo/zzz"]);
        assert_eq!(paths(&changes.delete), vec!["foo/xxx"]);
        assert_eq!(changes.to_string(), "2 to transfer, 1 to delete");
    }

    #[test]
    fn test_empty_source_deletes_everything() {
        let dest = manifest(&[("a", "1"), ("b/c", "2")]);
        let changes = diff(&Manifest::new(), &dest);
        assert!(changes.transfer.is_empty());
        assert_eq!(changes.delete.len(), 2);
    }

    fn arb_manifest() -> impl Strategy<Value = Manifest> {
        prop::collection::btree_map("[a-d]{1,2}(/[a-d]{1,2})?", 0u8..3, 0..12).prop_map(|m| {
            m.into_iter()
                .map(|(p, c)| (RelPath::new(p).unwrap(), ContentHash::of(&[c])))
                .collect::<Manifest>()
        })
    }

    proptest! {
        #[test]
        fn prop_transfer_and_delete_are_disjoint(source in arb_manifest(), dest in arb_manifest()) {
            let changes = diff(&source, &dest);
            prop_assert!(changes.transfer.is_disjoint(&changes.delete));
        }

        #[test]
        fn prop_applying_changes_reaches_source(source in arb_manifest(), dest in arb_manifest()) {
            let changes = diff(&source, &dest);

            let mut applied = dest.clone();
            for path in &changes.delete {
                applied.remove(path.as_str());
            }
            for path in &changes.transfer {
                applied.insert(path.clone(), *source.get(path.as_str()).unwrap());
            }

            prop_assert_eq!(applied, source);
        }

        #[test]
        fn prop_self_diff_is_empty(m in arb_manifest()) {
            prop_assert!(diff(&m, &m).is_empty());
        }
    }
}
