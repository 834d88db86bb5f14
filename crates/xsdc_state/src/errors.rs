//! Diagnostic codes for symbol-table conflicts.
//!
//! `E201` duplicate global definition, `W201` its mdef-downgraded form.

use xsdc_diagnostics::{Category, Diagnostic, DiagnosticCode, SourceLocation};

/// Duplicate top-level definition.
pub const E201: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 201,
};

/// Duplicate top-level definition downgraded by the mdef policy.
pub const W201: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 201,
};

/// Builds the duplicate-definition diagnostic, downgraded to a warning
/// when the mdef policy allows duplicates in the affected namespace.
pub fn duplicate_definition(
    kind_label: &str,
    name: &str,
    first_defined_in: &str,
    location: SourceLocation,
    downgraded: bool,
) -> Diagnostic {
    let message = format!("duplicate global {kind_label} '{name}'");
    let note = format!("first defined in {first_defined_in}; the new definition is ignored");
    if downgraded {
        Diagnostic::warning(W201, message, location).with_note(note)
    } else {
        Diagnostic::error(E201, message, location).with_note(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsdc_diagnostics::Severity;

    #[test]
    fn downgrade_switches_severity() {
        let loc = SourceLocation::document("file:///b.xsd");
        let err = duplicate_definition("type", "T", "file:///a.xsd", loc.clone(), false);
        assert_eq!(err.severity, Severity::Error);
        let warn = duplicate_definition("type", "T", "file:///a.xsd", loc, true);
        assert_eq!(warn.severity, Severity::Warning);
        assert_eq!(warn.code, W201);
    }
}
