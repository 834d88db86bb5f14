//! Error types for the binary type system store.

use std::path::PathBuf;

/// Errors raised while reading or writing `.xsb` units.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while reading or writing a store file.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A unit's payload could not be encoded or decoded.
    #[error("malformed store unit {path}: {reason}")]
    Malformed {
        /// The unit file involved.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A unit carries a version this reader cannot load.
    #[error("store unit {path} has format version {found_major}.{found_minor}, reader supports {supported_major}.{supported_minor}")]
    UnsupportedVersion {
        /// The unit file involved.
        path: PathBuf,
        /// Major version found in the file.
        found_major: u16,
        /// Minor version found in the file.
        found_minor: u16,
        /// Major version this reader writes.
        supported_major: u16,
        /// Minor version this reader writes.
        supported_minor: u16,
    },

    /// A unit carries a filetype code other than the expected one.
    #[error("store unit {path} is not a {expected} unit")]
    WrongFileType {
        /// The unit file involved.
        path: PathBuf,
        /// The expected filetype label.
        expected: &'static str,
    },

    /// A handle was requested that the index does not list.
    #[error("unknown handle {handle:?} in type system {system}")]
    UnknownHandle {
        /// The requested handle.
        handle: String,
        /// The type system queried.
        system: String,
    },

    /// An external handle could not be satisfied by the builtin pool or
    /// the configured linker.
    #[error("external reference {handle:?} could not be resolved")]
    UnresolvedExternal {
        /// The prefixed handle.
        handle: String,
    },

    /// A partial (recovered-errors) type system was passed to `save`.
    #[error("type system {name} is incomplete and cannot be saved")]
    IncompleteSystem {
        /// The type system's name.
        name: String,
    },
}
