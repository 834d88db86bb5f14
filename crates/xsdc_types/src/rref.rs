//! Lazily-resolved component references.

use crate::component::{ComponentKind, SchemaComponent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use xsdc_common::QName;

/// The identity a [`Ref`] points at: a component kind and qualified name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RefKey {
    /// The kind of the target component.
    pub kind: ComponentKind,
    /// The qualified name of the target component.
    pub name: QName,
}

/// Resolves `(kind, name)` identities to components.
///
/// Implemented by type systems (own containers, chained to the builtin
/// pool and any external linker) and by the lazy binary store.
pub trait ComponentLookup {
    /// Finds the component with the given kind and name, or `None`.
    fn lookup(&self, kind: ComponentKind, name: &QName) -> Option<Arc<SchemaComponent>>;
}

/// An indirection to another component.
///
/// A `Ref` carries the target identity and a memoized resolution. The
/// resolved component, once computed, never changes: components are
/// immutable after build, and the memo cell is write-once. A failed lookup
/// is not memoized, so resolution can be retried against a more complete
/// lookup later.
#[derive(Clone, Serialize, Deserialize)]
pub struct Ref {
    key: RefKey,
    #[serde(skip)]
    cell: OnceLock<Arc<SchemaComponent>>,
}

impl Ref {
    /// Creates an unresolved reference to the given kind and name.
    pub fn new(kind: ComponentKind, name: QName) -> Self {
        Self {
            key: RefKey { kind, name },
            cell: OnceLock::new(),
        }
    }

    /// Creates a reference already resolved to `component`.
    ///
    /// Used for fallback substitution (the any-type) and for references
    /// satisfied directly by an external linker at translation time.
    pub fn resolved_to(component: Arc<SchemaComponent>) -> Self {
        let cell = OnceLock::new();
        let key = RefKey {
            kind: component.kind(),
            name: component.name.clone(),
        };
        let _ = cell.set(component);
        Self { key, cell }
    }

    /// Returns the target identity.
    pub fn key(&self) -> &RefKey {
        &self.key
    }

    /// Returns the memoized component, if resolution already happened.
    pub fn get(&self) -> Option<&Arc<SchemaComponent>> {
        self.cell.get()
    }

    /// Memoizes `component` as this reference's resolution.
    ///
    /// Insert-if-absent: if a resolution is already memoized it wins and
    /// `component` is discarded. Returns the winning component.
    pub fn bind(&self, component: Arc<SchemaComponent>) -> Arc<SchemaComponent> {
        self.cell.get_or_init(|| component).clone()
    }

    /// Resolves this reference through `lookup`, memoizing the result.
    ///
    /// Idempotent: subsequent calls return the memoized component without
    /// consulting the lookup. If two threads race, whichever resolution
    /// finishes first wins and the loser's value is discarded.
    pub fn resolve(&self, lookup: &dyn ComponentLookup) -> Option<Arc<SchemaComponent>> {
        if let Some(c) = self.cell.get() {
            return Some(c.clone());
        }
        let found = lookup.lookup(self.key.kind, &self.key.name)?;
        Some(self.cell.get_or_init(|| found).clone())
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never chase the memo cell: the graph may be cyclic.
        f.debug_struct("Ref")
            .field("kind", &self.key.kind)
            .field("name", &self.key.name)
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Ref {}
