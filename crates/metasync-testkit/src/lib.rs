//! # Metasync Testkit
//!
//! Testing utilities for metasync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: temp-dir backed trees for setting up local endpoints
//! - **Recording storage**: a storage double that logs every call and can
//!   inject write failures
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust
//! use metasync_testkit::TestTree;
//!
//! let tree = TestTree::with_files(&[("xxx", "yyy\n"), ("foo/zzz", "z")]);
//! assert_eq!(tree.files(), vec!["foo/zzz", "xxx"]);
//! ```
//!
//! ## Recording Storage
//!
//! ```rust,ignore
//! let storage = Arc::new(RecordingStorage::new(MemoryStorage::new()));
//! executor.sync(&local, &remote).await?;
//! assert_eq!(storage.puts(), vec!["www/.meta-sync"]);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use metasync_testkit::generators::manifest;
//!
//! proptest! {
//!     #[test]
//!     fn manifest_text_roundtrips(m in manifest(32)) {
//!         prop_assert_eq!(Manifest::parse(&m.to_text().unwrap()).unwrap(), m);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod recording;

pub use fixtures::TestTree;
pub use recording::{RecordingStorage, StorageOp};
