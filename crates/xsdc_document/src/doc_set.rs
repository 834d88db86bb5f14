//! Dense arena of downloaded documents.

use crate::model::SchemaDocument;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque, copyable ID for a document in a [`DocumentSet`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DocId(u32);

impl DocId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Arena of all documents pulled into one compilation.
///
/// Documents are appended and never removed, so IDs stay stable for the
/// lifetime of the set. Documents are held behind `Arc` because the digest
/// cache hands out the same document object for multiple URLs.
#[derive(Default)]
pub struct DocumentSet {
    docs: Vec<Arc<SchemaDocument>>,
}

impl DocumentSet {
    /// Creates an empty document set.
    pub fn new() -> Self {
        Self { docs: Vec::new() }
    }

    /// Adds a document and returns its ID.
    pub fn add(&mut self, doc: SchemaDocument) -> DocId {
        let id = DocId::from_raw(self.docs.len() as u32);
        self.docs.push(Arc::new(doc));
        id
    }

    /// Returns the document with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: DocId) -> &Arc<SchemaDocument> {
        &self.docs[id.as_raw() as usize]
    }

    /// Returns the number of documents in the set.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns `true` if the set holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Iterates over `(id, document)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Arc<SchemaDocument>)> {
        self.docs
            .iter()
            .enumerate()
            .map(|(i, d)| (DocId::from_raw(i as u32), d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::DocumentProperties;
    use xsdc_common::ContentHash;

    fn doc(url: &str) -> SchemaDocument {
        SchemaDocument::empty(
            None,
            DocumentProperties::new(url, ContentHash::from_bytes(url.as_bytes())),
        )
    }

    #[test]
    fn ids_are_stable() {
        let mut set = DocumentSet::new();
        let a = set.add(doc("file:///a.xsd"));
        let b = set.add(doc("file:///b.xsd"));
        assert_ne!(a, b);
        assert_eq!(set.get(a).properties.source_url, "file:///a.xsd");
        assert_eq!(set.get(b).properties.source_url, "file:///b.xsd");
    }

    #[test]
    fn iter_in_order() {
        let mut set = DocumentSet::new();
        set.add(doc("file:///a.xsd"));
        set.add(doc("file:///b.xsd"));
        let urls: Vec<_> = set
            .iter()
            .map(|(_, d)| d.properties.source_url.clone())
            .collect();
        assert_eq!(urls, vec!["file:///a.xsd", "file:///b.xsd"]);
    }
}
