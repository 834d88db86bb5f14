//! Document-graph resolution: downloading, deduplication, import/include
//! discovery, and redefinition ordering.
//!
//! The [`Downloader`] fetches and deduplicates raw schema documents by
//! content digest and by `(namespace, location)` identity. The
//! [`ImportGraphResolver`] walks `import`/`include`/`redefine` clauses
//! breadth-first, producing the ordered set of documents to translate
//! (with chameleon namespaces attached) and the inclusion graph needed to
//! order redefinitions. The redefinition sorter turns the redefinitions of
//! one component name into a linear base-to-derived chain.

#![warn(missing_docs)]

pub mod downloader;
pub mod errors;
pub mod import_graph;
pub mod redefine_sort;
pub mod urls;

pub use downloader::Downloader;
pub use import_graph::{ImportGraphResolver, RedefineEdge, ResolvedGraph, ScheduleEntry};
pub use redefine_sort::{sort_redefinitions, RedefineCandidate};
pub use urls::resolve_location;
