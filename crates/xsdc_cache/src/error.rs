//! Error types for the recompilation cache.

use std::path::PathBuf;

/// Errors raised while reading or writing cache state.
///
/// Reading is fail-safe at the call sites: a load error is treated as a
/// cache miss and triggers a full rebuild. Writing reports errors so the
/// caller can warn that the next build will not be incremental.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest could not be serialized.
    #[error("failed to serialize build manifest: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}
