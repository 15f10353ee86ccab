//! # Metasync Sync
//!
//! Manifest-based diff-and-sync engine between a local directory and an
//! object-store prefix.
//!
//! ## Overview
//!
//! Every synced tree carries a manifest (path → content hash) in a reserved
//! slot at its root. A run computes the source manifest, loads the
//! destination's, diffs them, applies only the resulting transfers and
//! deletions, and finally commits the source manifest to the destination.
//!
//! ## Key Properties
//!
//! - **Minimal**: unchanged files are never transferred
//! - **Idempotent**: re-running after any failure converges
//! - **Guarded**: a remote source without a manifest is refused before any
//!   mutation, since it would otherwise read as "delete everything"
//! - **Source wins**: hash mismatches are resolved by overwriting
//!
//! ## Usage
//!
//! ```rust,no_run
//! use metasync_core::SyncEndpoint;
//! use metasync_store::FsStorage;
//! use metasync_sync::{SyncConfig, SyncExecutor};
//!
//! async fn example() {
//!     let executor = SyncExecutor::new(FsStorage::new("/srv/objects"), SyncConfig::default());
//!
//!     let source = SyncEndpoint::parse("site").unwrap();
//!     let dest = SyncEndpoint::parse("bucket:www").unwrap();
//!
//!     let report = executor.sync(&source, &dest).await.unwrap();
//!     println!("{} files transferred", report.transferred.len());
//! }
//! ```
//!
//! ## Phases
//!
//! ```text
//! Start -> GuardChecked -> ManifestsLoaded -> Diffed -> Applying -> Committed
//! ```
//!
//! Any error moves the run to `Aborted` and is returned as-is.

pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod local;

pub use builder::ManifestBuilder;
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use executor::{SyncDirection, SyncExecutor, SyncPhase, SyncReport};
