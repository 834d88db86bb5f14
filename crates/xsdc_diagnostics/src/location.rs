//! Source locations for diagnostics.
//!
//! Schema documents are identified by URL, not by file id: a document may
//! have been downloaded, redirected by an entity resolver, or deduplicated
//! under several URLs. Line/column information is optional because it is
//! only available when the parser was asked to annotate line numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location within a schema document, identified by source URL.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SourceLocation {
    /// The source URL of the document.
    pub url: String,
    /// 1-based line number, if line annotations were requested.
    pub line: Option<u32>,
    /// 1-based column number, if known.
    pub column: Option<u32>,
}

impl SourceLocation {
    /// A location with no document attached (e.g. whole-compile errors).
    pub fn unknown() -> Self {
        Self {
            url: String::new(),
            line: None,
            column: None,
        }
    }

    /// A location identifying a whole document by its URL.
    pub fn document(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            line: None,
            column: None,
        }
    }

    /// A location with line (and optionally column) information.
    pub fn at(url: impl Into<String>, line: u32, column: Option<u32>) -> Self {
        Self {
            url: url.into(),
            line: Some(line),
            column,
        }
    }

    /// Returns `true` if no document is attached.
    pub fn is_unknown(&self) -> bool {
        self.url.is_empty()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "<unknown>");
        }
        write!(f, "{}", self.url)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(col) = self.column {
                write!(f, ":{col}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_document_only() {
        let loc = SourceLocation::document("file:///a.xsd");
        assert_eq!(format!("{loc}"), "file:///a.xsd");
    }

    #[test]
    fn display_with_line_col() {
        let loc = SourceLocation::at("file:///a.xsd", 12, Some(3));
        assert_eq!(format!("{loc}"), "file:///a.xsd:12:3");
    }

    #[test]
    fn unknown() {
        let loc = SourceLocation::unknown();
        assert!(loc.is_unknown());
        assert_eq!(format!("{loc}"), "<unknown>");
    }
}
