//! # Metasync Core
//!
//! Pure primitives for metasync: content hashes, relative paths, manifests,
//! manifest diffing, and sync endpoints.
//!
//! This crate contains no filesystem walking, no storage, no networking. It is
//! pure computation over manifests.
//!
//! ## Key Types
//!
//! - [`ContentHash`] - BLAKE3 digest of a file's bytes
//! - [`RelPath`] - Validated `/`-separated relative path
//! - [`Manifest`] - Path → hash snapshot of a tree, with a stable text encoding
//! - [`ChangeSet`] - Transfers and deletions produced by [`diff`]
//! - [`SyncEndpoint`] - A local directory or a `container:prefix` location

pub mod diff;
pub mod endpoint;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod path;

pub use diff::{diff, ChangeSet};
pub use endpoint::{RemoteLocation, SyncEndpoint};
pub use error::{CoreError, ManifestParseError};
pub use hash::ContentHash;
pub use manifest::{validate_manifest_name, Manifest, DEFAULT_MANIFEST_NAME};
pub use path::RelPath;
