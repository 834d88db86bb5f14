//! Shared foundational types used across the XSDC schema compiler.
//!
//! This crate provides content hashing for document identity and cache
//! invalidation, interned identifiers for hot namespace comparisons,
//! namespace-qualified names, and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod qname;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use qname::QName;
pub use result::{InternalError, XsdcResult};
