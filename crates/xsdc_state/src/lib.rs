//! Mutable compilation state: the symbol table and dependency tracker.
//!
//! One [`CompileContext`] exists per compile invocation and is threaded as
//! an explicit parameter through every stage; a nested compile constructs
//! a nested context. The context owns the per-namespace container
//! builders, the global name maps, the duplicate-definition (mdef) policy,
//! the spelling index for diagnostics, and the dependency tracker for
//! incremental rebuilds.

#![warn(missing_docs)]

pub mod deps;
pub mod errors;
pub mod state;

pub use deps::DependencyTracker;
pub use state::CompileContext;
