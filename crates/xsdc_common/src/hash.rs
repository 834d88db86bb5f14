//! Content hashing for document deduplication and incremental compilation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit content hash computed using XXH3.
///
/// Two schema documents with the same `ContentHash` are treated as the same
/// document regardless of the location they were fetched from. The hash is
/// also the change-detection key for incremental recompilation: a source
/// file whose hash matches the persisted manifest entry is unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash of a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Reconstructs a hash from its raw 16-byte representation.
    pub fn from_raw(raw: [u8; 16]) -> Self {
        Self(raw)
    }

    /// Returns the raw 16-byte representation.
    pub fn as_raw(&self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"<schema targetNamespace='urn:a'/>");
        let b = ContentHash::from_bytes(b"<schema targetNamespace='urn:a'/>");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"<schema/>");
        let b = ContentHash::from_bytes(b"<schema />");
        assert_ne!(a, b);
    }

    #[test]
    fn raw_roundtrip() {
        let h = ContentHash::from_bytes(b"bytes");
        assert_eq!(ContentHash::from_raw(h.as_raw()), h);
    }

    #[test]
    fn display_is_hex() {
        let s = format!("{}", ContentHash::from_bytes(b"x"));
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
