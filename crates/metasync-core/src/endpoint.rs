//! Sync endpoints.
//!
//! An endpoint is either a local directory or a `container:prefix` location
//! in an object store.

use std::fmt;
use std::path::PathBuf;

use crate::error::CoreError;

/// A prefix inside an object-store container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteLocation {
    /// Bucket or container name.
    pub container: String,
    /// Key prefix, without leading or trailing `/`.
    pub prefix: String,
}

impl RemoteLocation {
    pub fn new(container: impl Into<String>, prefix: impl AsRef<str>) -> Self {
        Self {
            container: container.into(),
            prefix: prefix.as_ref().trim_matches('/').to_string(),
        }
    }

    /// Object key for a name relative to this prefix.
    pub fn key_for(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }
}

impl fmt::Display for RemoteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container, self.prefix)
    }
}

/// One side of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEndpoint {
    Local(PathBuf),
    Remote(RemoteLocation),
}

impl SyncEndpoint {
    /// Parse a command-line style endpoint.
    ///
    /// `container:prefix` is remote when the container part is at least two
    /// characters of `[A-Za-z0-9._-]`; anything else (including `C:\dir`) is a
    /// local path.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() {
            return Err(CoreError::InvalidEndpoint("empty endpoint".into()));
        }

        if let Some((container, prefix)) = s.split_once(':') {
            if is_container_name(container) {
                return Ok(SyncEndpoint::Remote(RemoteLocation::new(container, prefix)));
            }
        }

        Ok(SyncEndpoint::Local(PathBuf::from(s)))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SyncEndpoint::Local(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SyncEndpoint::Remote(_))
    }
}

fn is_container_name(s: &str) -> bool {
    s.len() >= 2
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

impl fmt::Display for SyncEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEndpoint::Local(path) => write!(f, "{}", path.display()),
            SyncEndpoint::Remote(remote) => write!(f, "{}", remote),
        }
    }
}

impl std::str::FromStr for SyncEndpoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncEndpoint::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        let ep = SyncEndpoint::parse("my-bucket:bar").unwrap();
        assert_eq!(ep, SyncEndpoint::Remote(RemoteLocation::new("my-bucket", "bar")));
        assert_eq!(ep.to_string(), "my-bucket:bar");
    }

    #[test]
    fn test_parse_remote_trims_prefix_slashes() {
        let ep = SyncEndpoint::parse("bucket:/a/b/").unwrap();
        match ep {
            SyncEndpoint::Remote(remote) => {
                assert_eq!(remote.prefix, "a/b");
                assert_eq!(remote.key_for("xxx"), "a/b/xxx");
            }
            other => panic!("expected remote, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_prefix_keys() {
        let remote = RemoteLocation::new("bucket", "");
        assert_eq!(remote.key_for(".meta-sync"), ".meta-sync");
    }

    #[test]
    fn test_parse_local() {
        assert!(SyncEndpoint::parse("foo").unwrap().is_local());
        assert!(SyncEndpoint::parse("./foo/bar").unwrap().is_local());
        assert!(SyncEndpoint::parse("/tmp/x:y").unwrap().is_local());
        assert!(SyncEndpoint::parse("C:\\data").unwrap().is_local());
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(SyncEndpoint::parse("").is_err());
    }
}
