//! Namespace-qualified component names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A namespace-qualified name identifying a global schema component.
///
/// The namespace may be the empty string (the "no namespace" case); the
/// local part is never empty for a well-formed global component. `QName`s
/// stay plain strings rather than interned ids because they must survive
/// binary serialization and cross-type-system linking unchanged.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct QName {
    /// The namespace URI, possibly empty.
    pub namespace: String,
    /// The local name within the namespace.
    pub local: String,
}

impl QName {
    /// Creates a qualified name from a namespace URI and a local name.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Creates a name in the empty namespace.
    pub fn local_only(local: impl Into<String>) -> Self {
        Self::new("", local)
    }

    /// Returns `true` if this name lives in the empty namespace.
    pub fn has_no_namespace(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_namespace() {
        let q = QName::new("http://a", "T");
        assert_eq!(format!("{q}"), "{http://a}T");
    }

    #[test]
    fn display_without_namespace() {
        let q = QName::local_only("T");
        assert_eq!(format!("{q}"), "T");
        assert!(q.has_no_namespace());
    }

    #[test]
    fn equality_includes_namespace() {
        assert_ne!(QName::new("http://a", "T"), QName::new("http://b", "T"));
        assert_eq!(QName::new("http://a", "T"), QName::new("http://a", "T"));
    }
}
