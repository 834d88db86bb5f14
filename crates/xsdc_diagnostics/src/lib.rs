//! Structured diagnostics for the XSDC schema compiler.
//!
//! All user-facing problems are [`Diagnostic`] values appended to a
//! [`DiagnosticSink`]; they are never thrown. The sink additionally tracks
//! how many errors were individually recovered, which drives the
//! partial-type-system decision at the end of a compile.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::SourceLocation;
pub use severity::Severity;
pub use sink::DiagnosticSink;
