//! # Metasync Store
//!
//! Object-store abstraction for metasync. Provides a trait-based interface
//! for object get/put/delete/list with in-memory and directory-backed
//! implementations.
//!
//! ## Overview
//!
//! The sync engine talks to remote storage only through the
//! [`StorageClient`] trait, so it is transport-agnostic. Cloud transports
//! live outside this workspace; [`FsStorage`] maps containers to directories
//! and [`MemoryStorage`] backs tests.
//!
//! ## Key Types
//!
//! - [`StorageClient`] - The async trait for all object operations
//! - [`StorageExt`] - Convenience helpers on top of it
//! - [`FsStorage`] - Objects as files under a root directory
//! - [`MemoryStorage`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use metasync_store::{FsStorage, StorageClient};
//!
//! async fn example() {
//!     let store = FsStorage::new("/var/lib/metasync");
//!
//!     store.put("bucket", "bar/xxx", Bytes::from_static(b"yyy\n")).await.unwrap();
//!     let data = store.get("bucket", "bar/xxx").await.unwrap();
//!     assert_eq!(data.as_deref(), Some(&b"yyy\n"[..]));
//! }
//! ```

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use fs::FsStorage;
pub use memory::MemoryStorage;
pub use traits::{StorageClient, StorageExt};
