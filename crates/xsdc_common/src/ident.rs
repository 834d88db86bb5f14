//! Interned identifiers for cheap cloning and O(1) equality comparison.
//!
//! Namespace URIs are long strings that are compared and hashed constantly
//! while the symbol table and dependency tracker run; interning turns every
//! comparison into a `u32` compare.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned string, typically a namespace URI.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw `u32` index.
    ///
    /// Primarily intended for tests; in normal use identifiers come from
    /// [`Interner::get_or_intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32` which is always a valid `usize` on 32-bit
// and 64-bit platforms. `try_from_usize` rejects values that don't fit.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// One interner lives inside each compile context and each dependency
/// tracker; interned identifiers are only meaningful relative to the
/// interner that produced them.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`]. Re-interning an already
    /// known string returns the existing identifier without allocating.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Returns the identifier for a string if it was interned before.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_twice_same_ident() {
        let interner = Interner::new();
        let a = interner.get_or_intern("http://example.org/ns");
        let b = interner.get_or_intern("http://example.org/ns");
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_roundtrip() {
        let interner = Interner::new();
        let id = interner.get_or_intern("urn:test");
        assert_eq!(interner.resolve(id), "urn:test");
    }

    #[test]
    fn get_without_intern() {
        let interner = Interner::new();
        assert!(interner.get("never-seen").is_none());
        interner.get_or_intern("seen");
        assert!(interner.get("seen").is_some());
    }
}
