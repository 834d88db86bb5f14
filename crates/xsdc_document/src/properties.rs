//! Per-document metadata attached by the downloader.

use serde::{Deserialize, Serialize};
use xsdc_common::ContentHash;

/// Metadata carried by every downloaded schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentProperties {
    /// The absolute URL the document was loaded from. Relative references
    /// inside the document are resolved against this.
    pub source_url: String,

    /// Content digest of the raw document bytes. Two documents with the
    /// same digest are the same document, whatever their URLs.
    pub digest: ContentHash,
}

impl DocumentProperties {
    /// Creates document properties for a document fetched from `url`.
    pub fn new(url: impl Into<String>, digest: ContentHash) -> Self {
        Self {
            source_url: url.into(),
            digest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct() {
        let props = DocumentProperties::new("file:///a.xsd", ContentHash::from_bytes(b"x"));
        assert_eq!(props.source_url, "file:///a.xsd");
    }
}
