//! Relative paths as stored in manifests.
//!
//! Manifest keys are always `/`-separated, regardless of the host platform,
//! so a manifest written on one machine diffs cleanly against a tree walked
//! on another.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A validated relative file path: `/`-separated, no leading slash, and no
/// empty, `.` or `..` components.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelPath(String);

impl RelPath {
    /// Validate and wrap a `/`-separated path.
    pub fn new(path: impl Into<String>) -> Result<Self, CoreError> {
        let path = path.into();
        if let Err(reason) = validate(&path) {
            return Err(CoreError::InvalidPath { path, reason });
        }
        Ok(Self(path))
    }

    /// Build from a filesystem path relative to some root.
    ///
    /// Fails on absolute paths, parent references, and components that are
    /// not valid UTF-8.
    pub fn from_relative_path(path: &Path) -> Result<Self, CoreError> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| CoreError::InvalidPath {
                        path: path.to_string_lossy().into_owned(),
                        reason: "not valid UTF-8",
                    })?;
                    parts.push(part);
                }
                Component::CurDir => {}
                _ => {
                    return Err(CoreError::InvalidPath {
                        path: path.to_string_lossy().into_owned(),
                        reason: "not a plain relative path",
                    })
                }
            }
        }
        Self::new(parts.join("/"))
    }

    /// The path as a `/`-separated string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against a local root using native separators.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        out.extend(self.0.split('/'));
        out
    }

    /// The final component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

fn validate(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("empty path");
    }
    if path.starts_with('/') {
        return Err("leading slash");
    }
    if path.contains('\\') {
        return Err("backslash separator");
    }
    if path.contains('\0') {
        return Err("NUL byte");
    }
    for part in path.split('/') {
        match part {
            "" => return Err("empty component"),
            "." | ".." => return Err("relative component"),
            _ => {}
        }
    }
    Ok(())
}

impl fmt::Debug for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelPath({:?})", self.0)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RelPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RelPath {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl Serialize for RelPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RelPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RelPath::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        for p in ["xxx", "foo/xxx", "a/b/c.txt", ".hidden", "dir/.meta-sync"] {
            assert!(RelPath::new(p).is_ok(), "{p} should be valid");
        }
    }

    #[test]
    fn test_invalid_paths() {
        for p in ["", "/abs", "a//b", "a/", "./a", "a/../b", "a\\b"] {
            assert!(RelPath::new(p).is_err(), "{p} should be rejected");
        }
    }

    #[test]
    fn test_from_relative_path() {
        let rel = RelPath::from_relative_path(Path::new("foo").join("bar").as_path()).unwrap();
        assert_eq!(rel.as_str(), "foo/bar");

        assert!(RelPath::from_relative_path(Path::new("../escape")).is_err());
    }

    #[test]
    fn test_to_native() {
        let rel = RelPath::new("foo/bar/baz").unwrap();
        let native = rel.to_native(Path::new("root"));
        assert_eq!(native, Path::new("root").join("foo").join("bar").join("baz"));
        assert_eq!(rel.file_name(), "baz");
    }
}
