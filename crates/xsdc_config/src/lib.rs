//! Compiler configuration loaded from `xsdc.toml`.
//!
//! Covers the duplicate-definition ("mdef") policy, download policy, the
//! partial-type-system option, and the binary store layout. Every section
//! has sensible defaults so an absent or empty configuration file yields a
//! strict, offline-friendly compiler.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{CompilerConfig, DownloadConfig, SchemaOptions, StoreConfig};
