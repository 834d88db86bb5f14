//! Diagnostic codes for structural translation.

use xsdc_common::QName;
use xsdc_diagnostics::{Category, Diagnostic, DiagnosticCode, SourceLocation};

/// A declaration with a malformed or missing name.
pub const E202: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 202,
};

/// A declaration carrying both a type reference and a nested definition.
pub const E203: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 203,
};

/// A reference that matched no global definition.
pub const E204: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 204,
};

/// Builds the malformed-name diagnostic. The declaration is dropped.
pub fn malformed_name(kind_label: &str, location: SourceLocation) -> Diagnostic {
    Diagnostic::error(
        E202,
        format!("{kind_label} declaration has a missing or malformed name"),
        location,
    )
    .recovered()
}

/// Builds the ref-and-nested-definition conflict diagnostic. The
/// declaration keeps the safe any-type fallback.
pub fn ref_and_nested_conflict(name: &str, location: SourceLocation) -> Diagnostic {
    Diagnostic::error(
        E203,
        format!("'{name}' carries both a type reference and a nested type definition"),
        location,
    )
    .recovered()
}

/// Builds the unresolved-reference diagnostic, with a nearest-spelling
/// note when one is available.
pub fn unresolved_reference(
    kind_label: &str,
    name: &QName,
    location: SourceLocation,
    hint: Option<(&QName, &str)>,
) -> Diagnostic {
    let mut diag = Diagnostic::error(
        E204,
        format!("unresolved reference to {kind_label} '{name}'"),
        location,
    )
    .recovered();
    if let Some((candidate, defined_in)) = hint {
        diag = diag.with_note(format!("did you mean '{candidate}' (defined in {defined_in})?"));
    }
    diag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_reference_carries_hint() {
        let hint_name = QName::new("http://a", "PurchaseOrder");
        let diag = unresolved_reference(
            "type",
            &QName::new("http://a", "purchaseorder"),
            SourceLocation::document("file:///a.xsd"),
            Some((&hint_name, "file:///a.xsd")),
        );
        assert_eq!(diag.code, E204);
        assert_eq!(diag.notes.len(), 1);
        assert!(diag.notes[0].contains("PurchaseOrder"));
    }

    #[test]
    fn all_translation_errors_are_recovered() {
        let loc = SourceLocation::document("file:///a.xsd");
        assert!(malformed_name("element", loc.clone()).recovered);
        assert!(ref_and_nested_conflict("E", loc.clone()).recovered);
        assert!(unresolved_reference("type", &QName::new("", "T"), loc, None).recovered);
    }
}
