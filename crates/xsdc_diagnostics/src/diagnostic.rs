//! Structured diagnostic messages with severity, codes, and locations.

use crate::code::DiagnosticCode;
use crate::location::SourceLocation;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Diagnostics are the only mechanism for reporting user-facing problems.
/// Each diagnostic carries a severity, a unique code, a message, a source
/// location, optional notes (e.g. spelling suggestions, participating file
/// lists), and a `recovered` flag recording whether the compiler
/// substituted a safe fallback and continued past this error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where the problem was detected.
    pub location: SourceLocation,
    /// Explanatory footnotes ("note: ...").
    pub notes: Vec<String>,
    /// Whether the compiler recovered from this error by substituting a
    /// safe fallback. Only meaningful for [`Severity::Error`].
    pub recovered: bool,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location,
            notes: Vec::new(),
            recovered: false,
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(
        code: DiagnosticCode,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            location,
            notes: Vec::new(),
            recovered: false,
        }
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Marks this error as recovered: a fallback was substituted and the
    /// compile continued.
    pub fn recovered(mut self) -> Self {
        self.recovered = true;
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}]: {} ({})",
            self.severity, self.code, self.message, self.location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Error, 201);
        let diag = Diagnostic::error(
            code,
            "duplicate global type",
            SourceLocation::document("file:///a.xsd"),
        );
        assert_eq!(diag.severity, Severity::Error);
        assert!(!diag.recovered);
    }

    #[test]
    fn recovered_builder() {
        let code = DiagnosticCode::new(Category::Error, 202);
        let diag = Diagnostic::error(code, "malformed ref", SourceLocation::unknown()).recovered();
        assert!(diag.recovered);
    }

    #[test]
    fn notes_accumulate() {
        let code = DiagnosticCode::new(Category::Error, 204);
        let diag = Diagnostic::error(code, "unresolved type", SourceLocation::unknown())
            .with_note("did you mean 'PurchaseOrder' (defined in file:///po.xsd)?");
        assert_eq!(diag.notes.len(), 1);
    }
}
