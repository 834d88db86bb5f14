//! Structural translation and the top-level compile pipeline.
//!
//! Ties the stages together: document-graph resolution, redefinition
//! ordering, translation into the compile context's symbol table, and
//! assembly of the final [`xsdc_types::TypeSystem`]. The compile entry
//! point also implements incremental rebuilds by carrying forward the
//! containers of unaffected namespaces from a prior system.

#![warn(missing_docs)]

pub mod compile;
pub mod errors;
pub mod translator;

pub use compile::{compile, CompileError, CompileOutput, PriorBuild};
pub use translator::Translator;
