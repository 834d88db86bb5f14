//! Diagnostic codes for document resolution and the redefinition graph.
//!
//! Error codes `E101`--`E112` cover download failures, invalid documents,
//! namespace mismatches, and redefinition-graph problems.

use xsdc_diagnostics::{Category, Diagnostic, DiagnosticCode, SourceLocation};

/// Download or location-resolution failure.
pub const E101: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 101,
};

/// Downloaded bytes are not a valid schema document.
pub const E102: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 102,
};

/// The namespace declared on an `import` does not match the imported
/// document's target namespace.
pub const E103: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 103,
};

/// An included document's target namespace matches neither the includer's
/// namespace nor the chameleon rule.
pub const E104: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 104,
};

/// Circular redefinition among a set of documents.
pub const E110: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 110,
};

/// Multiple redefinitions of one name with no inclusion relationship.
pub const E111: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 111,
};

/// A `redefine` clause whose target name never matched a global definition.
pub const E112: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 112,
};

/// Builds the download-failure diagnostic for a URL.
pub fn download_failure(url: &str, reason: &str, referenced_from: SourceLocation) -> Diagnostic {
    Diagnostic::error(E101, format!("could not load schema at {url}: {reason}"), referenced_from)
        .recovered()
}

/// Builds the invalid-document diagnostic for a URL.
pub fn invalid_document(url: &str, reason: &str) -> Diagnostic {
    Diagnostic::error(
        E102,
        format!("not a valid schema document: {reason}"),
        SourceLocation::document(url),
    )
    .recovered()
}

/// Builds the import-namespace-mismatch diagnostic.
pub fn import_namespace_mismatch(
    declared: &str,
    actual: &str,
    location: SourceLocation,
) -> Diagnostic {
    Diagnostic::error(
        E103,
        format!(
            "import declares namespace '{declared}' but the imported document's target namespace is '{actual}'"
        ),
        location,
    )
    .recovered()
}

/// Builds the include-namespace-mismatch diagnostic.
pub fn include_namespace_mismatch(
    includer_ns: &str,
    included_ns: &str,
    location: SourceLocation,
) -> Diagnostic {
    Diagnostic::error(
        E104,
        format!(
            "included document has target namespace '{included_ns}', which differs from the including document's namespace '{includer_ns}'"
        ),
        location,
    )
    .recovered()
}

/// Builds the circular-redefinition diagnostic with the participating
/// file list.
pub fn circular_redefinition(name: &str, participants: &[String]) -> Diagnostic {
    let mut diag = Diagnostic::error(
        E110,
        format!("circular redefinition of '{name}'"),
        SourceLocation::unknown(),
    )
    .recovered();
    for p in participants {
        diag = diag.with_note(format!("participating file: {p}"));
    }
    diag
}

/// Builds the multiple-unrelated-redefinition diagnostic.
pub fn multiple_redefinition(name: &str, dropped_from: &str) -> Diagnostic {
    Diagnostic::error(
        E111,
        format!("multiple unrelated redefinitions of '{name}'"),
        SourceLocation::document(dropped_from),
    )
    .with_note("the redefining documents do not include one another; this redefinition is ignored")
    .recovered()
}

/// Builds the redefined-component-not-found diagnostic.
pub fn redefined_not_found(kind_label: &str, name: &str, location: SourceLocation) -> Diagnostic {
    Diagnostic::error(
        E112,
        format!("redefined {kind_label} '{name}' was never defined"),
        location,
    )
    .recovered()
}
