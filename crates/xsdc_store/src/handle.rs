//! Handle assignment for persisted components.
//!
//! Every component saved to the store gets a handle: a filesystem-safe
//! string that names its unit file and keys every inter-component link in
//! the index. Handles are unique case-insensitively, since the store may
//! land on a case-preserving but case-folding filesystem.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use xsdc_common::QName;
use xsdc_types::{ComponentKind, SchemaComponent};

/// Prefix of a handle naming a builtin schema type.
pub const BUILTIN_PREFIX: &str = "_BI_";

/// Prefix of a handle naming a component in another type system.
pub const EXTERNAL_PREFIX: &str = "_XR_";

/// Prefix of the type-signature fallback for anonymous external types.
pub const SIGNATURE_PREFIX: &str = "_TS_";

/// Assigns unit handles to the components of one type system.
///
/// Keyed by component identity (the `Arc` pointer), not by name: the
/// links of a redefinition chain share a qualified name but each gets its
/// own handle and unit file.
#[derive(Default)]
pub struct HandlePool {
    by_ptr: HashMap<*const SchemaComponent, String>,
    entries: Vec<(String, ComponentKind)>,
    taken: HashSet<String>,
}

impl HandlePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `component`, assigning one on first call.
    pub fn assign(&mut self, component: &Arc<SchemaComponent>) -> String {
        let ptr = Arc::as_ptr(component);
        if let Some(h) = self.by_ptr.get(&ptr) {
            return h.clone();
        }
        let base = format!(
            "{}_{}",
            sanitize(&component.name.local),
            kind_suffix(component.kind())
        );
        let mut candidate = base.clone();
        let mut n = 1u32;
        while !self.taken.insert(candidate.to_ascii_lowercase()) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        self.by_ptr.insert(ptr, candidate.clone());
        self.entries.push((candidate.clone(), component.kind()));
        candidate
    }

    /// The handle already assigned to `component`, if any.
    pub fn handle_of(&self, component: &Arc<SchemaComponent>) -> Option<&str> {
        self.by_ptr
            .get(&Arc::as_ptr(component))
            .map(String::as_str)
    }

    /// All assigned handles with their kinds, in assignment order.
    pub fn entries(&self) -> &[(String, ComponentKind)] {
        &self.entries
    }
}

fn kind_suffix(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Type => "type",
        ComponentKind::Element => "element",
        ComponentKind::Attribute => "attribute",
        ComponentKind::ModelGroup => "group",
        ComponentKind::AttributeGroup => "attrgroup",
        ComponentKind::IdentityConstraint => "constraint",
    }
}

/// Reduces a local name to handle-safe characters.
///
/// The result never starts with an underscore, so plain handles can never
/// collide with the `_BI_`/`_XR_`/`_TS_` prefix space.
fn sanitize(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    for ch in local.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
        out.insert(0, 'x');
    }
    out
}

/// Encodes a string into a stable path usable as a unit filename.
///
/// Alphanumerics pass through; every other byte becomes `_xx` with the
/// byte's hex value, so distinct inputs always map to distinct paths.
pub fn hex_safe(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() {
            out.push(b as char);
        } else {
            out.push('_');
            out.push_str(&format!("{b:02x}"));
        }
    }
    out
}

/// A parsed cross-type-system handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalHandle {
    /// A builtin schema type, named by its local name.
    Builtin {
        /// The builtin's local name, e.g. `string`.
        local: String,
    },
    /// A named component defined by another type system.
    External {
        /// The target component's kind.
        kind: ComponentKind,
        /// The target component's qualified name.
        name: QName,
    },
    /// The fallback for anonymous external types, carried as an opaque
    /// signature the target system resolves itself.
    Signature {
        /// The opaque type signature.
        signature: String,
    },
}

/// Encodes a builtin-type handle.
pub fn encode_builtin(local: &str) -> String {
    format!("{BUILTIN_PREFIX}{local}")
}

/// Encodes a handle referencing a component of another type system.
pub fn encode_external(kind: ComponentKind, name: &QName) -> String {
    format!(
        "{EXTERNAL_PREFIX}{}|{}|{}",
        kind.code(),
        name.namespace,
        name.local
    )
}

/// Encodes the anonymous-type signature fallback.
pub fn encode_signature(signature: &str) -> String {
    format!("{SIGNATURE_PREFIX}{signature}")
}

/// Parses a prefixed handle; `None` for plain local-pool handles.
pub fn parse_external(handle: &str) -> Option<ExternalHandle> {
    if let Some(local) = handle.strip_prefix(BUILTIN_PREFIX) {
        return Some(ExternalHandle::Builtin {
            local: local.to_string(),
        });
    }
    if let Some(rest) = handle.strip_prefix(EXTERNAL_PREFIX) {
        let mut parts = rest.splitn(3, '|');
        let kind = parts
            .next()
            .and_then(|c| c.parse::<u8>().ok())
            .and_then(ComponentKind::from_code)?;
        let namespace = parts.next()?;
        let local = parts.next()?;
        return Some(ExternalHandle::External {
            kind,
            name: QName::new(namespace, local),
        });
    }
    if let Some(sig) = handle.strip_prefix(SIGNATURE_PREFIX) {
        return Some(ExternalHandle::Signature {
            signature: sig.to_string(),
        });
    }
    None
}
