//! The binary type system store.
//!
//! Persists a compiled type system as a directory of versioned `.xsb`
//! units: an index carrying the handle pool and name maps, one component
//! unit per handle, and pointer units for cross-package discovery.
//! Loading parses only the index; components stream in lazily via
//! [`LazyTypeSystem::resolve_handle`].

#![warn(missing_docs)]

pub mod error;
pub mod handle;
pub mod store;
pub mod xsb;

pub use error::StoreError;
pub use handle::{ExternalHandle, HandlePool};
pub use store::{LazyTypeSystem, TypeSystemStore};
pub use xsb::{FileType, VersionedField, XsbReader, XsbWriter};
