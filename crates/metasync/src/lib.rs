//! # Metasync
//!
//! Keeps a local directory and an object-store prefix in sync by comparing
//! manifests of content hashes, transferring only what changed.
//!
//! ## Overview
//!
//! Every synced tree stores a manifest (`.meta-sync` by default) at its root
//! mapping each file's relative path to the hash of its contents. A sync:
//!
//! - computes the source manifest (hashing a local tree, or reading the
//!   stored one for a remote prefix)
//! - diffs it against the destination's
//! - deletes obsolete files, then transfers new or changed ones
//! - writes the source manifest to the destination last
//!
//! A remote source without a manifest is refused, since it would otherwise
//! read as an empty tree and wipe the destination.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use metasync::{SyncConfig, Syncer};
//!
//! async fn example() -> metasync::Result<()> {
//!     let syncer = Syncer::with_store_root("/srv/objects", SyncConfig::default());
//!
//!     // Upload a folder, then mirror it somewhere else
//!     syncer.sync("public", "assets:www").await?;
//!     let report = syncer.sync("assets:www", "/var/www").await?;
//!     println!("{} files fetched", report.transferred.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `metasync::core` - Manifests, hashes, paths, endpoints, diffing
//! - `metasync::store` - Storage client trait and backends
//! - `metasync::sync` - The sync executor

pub mod error;
pub mod syncer;

// Re-export component crates
pub use metasync_core as core;
pub use metasync_store as store;
pub use metasync_sync as sync;

pub use error::{Error, Result};
pub use syncer::Syncer;

// Re-export commonly used types
pub use metasync_core::{ChangeSet, ContentHash, Manifest, RelPath, SyncEndpoint, DEFAULT_MANIFEST_NAME};
pub use metasync_store::{FsStorage, MemoryStorage, StorageClient};
pub use metasync_sync::{SyncConfig, SyncDirection, SyncError, SyncReport};
