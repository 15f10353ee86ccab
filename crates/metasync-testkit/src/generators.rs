//! Proptest generators for property-based testing.

use proptest::prelude::*;

use metasync_core::{ContentHash, Manifest, RelPath};

/// Generate a single path component.
pub fn path_component() -> impl Strategy<Value = String> {
    "[a-z0-9_][a-z0-9_.-]{0,11}".prop_map(String::from)
}

/// Generate a valid relative path of one to four components.
pub fn rel_path() -> impl Strategy<Value = RelPath> {
    prop::collection::vec(path_component(), 1..=4)
        .prop_map(|parts| RelPath::new(parts.join("/")).expect("generated path is valid"))
}

/// Generate a random ContentHash.
pub fn content_hash() -> impl Strategy<Value = ContentHash> {
    any::<[u8; 32]>().prop_map(ContentHash::from_bytes)
}

/// Generate a manifest with up to `max_entries` entries.
pub fn manifest(max_entries: usize) -> impl Strategy<Value = Manifest> {
    prop::collection::btree_map(rel_path(), content_hash(), 0..=max_entries)
        .prop_map(|entries| entries.into_iter().collect::<Manifest>())
}

/// Generate file contents of at most `max_len` bytes.
pub fn contents(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a set of files that can coexist in one directory tree: no path
/// is a prefix directory of another.
pub fn file_tree(max_files: usize) -> impl Strategy<Value = Vec<(RelPath, Vec<u8>)>> {
    prop::collection::btree_map(rel_path(), contents(256), 0..=max_files).prop_map(|files| {
        let paths: Vec<String> = files.keys().map(|p| p.as_str().to_string()).collect();
        files
            .into_iter()
            .filter(|(path, _)| {
                let dir_prefix = format!("{}/", path.as_str());
                !paths.iter().any(|other| other.starts_with(&dir_prefix))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_manifests_roundtrip(m in manifest(16)) {
            let text = m.to_text().unwrap();
            prop_assert_eq!(Manifest::parse(&text).unwrap(), m);
        }

        #[test]
        fn file_trees_have_no_file_dir_clashes(files in file_tree(16)) {
            for (a, _) in &files {
                for (b, _) in &files {
                    let clash = b.as_str().starts_with(&format!("{}/", a.as_str()));
                    prop_assert!(!clash, "{} is both a file and a directory", a);
                }
            }
        }
    }
}
