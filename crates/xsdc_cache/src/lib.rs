//! Incremental recompilation cache.
//!
//! Persists the content digest of every schema file that went into a
//! build along with the namespace-level dependency graph, so that a later
//! build can compile only the namespaces an edit actually invalidates.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod hasher;
pub mod manifest;

pub use cache::{BuildCache, RebuildPlan};
pub use error::CacheError;
pub use hasher::{ChangeSet, InputHasher};
pub use manifest::{BuildManifest, FileEntry};
