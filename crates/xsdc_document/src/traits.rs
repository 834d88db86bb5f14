//! External boundaries: document parsing and entity resolution.

use crate::model::SchemaDocument;

/// Error produced by a [`DocumentParser`] when bytes are not a valid
/// schema document.
#[derive(Debug, thiserror::Error)]
#[error("invalid schema document at {url}: {reason}")]
pub struct DocumentError {
    /// The URL the document was fetched from.
    pub url: String,
    /// What was wrong with it.
    pub reason: String,
}

impl DocumentError {
    /// Creates a new document error.
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Parses raw bytes into a [`SchemaDocument`].
///
/// XML parsing is outside the compiler; implementations bridge to whatever
/// XML stack the embedding application uses. The returned document's
/// `properties` are overwritten by the downloader (it knows the final URL
/// and the digest of the exact bytes fetched).
pub trait DocumentParser {
    /// Parses `bytes` fetched from `url`, validating that they form a
    /// schema document.
    fn parse(&self, bytes: &[u8], url: &str) -> Result<SchemaDocument, DocumentError>;
}

/// The result of consulting an [`EntityResolver`].
pub enum ResolvedEntity {
    /// The raw bytes of the document.
    Bytes(Vec<u8>),
    /// The document as text (encoded to UTF-8 bytes by the downloader).
    Text(String),
    /// Fetch from this URL instead.
    Redirect(String),
}

/// Optional hook mapping `(namespace, location)` pairs to streams or
/// redirected URLs, in the manner of an XML catalog.
///
/// When the resolver declines (`None`), the downloader falls back to a
/// direct URL fetch.
pub trait EntityResolver {
    /// Attempts to resolve the entity identified by an optional namespace
    /// and an absolute location URL.
    fn resolve_entity(&self, namespace: Option<&str>, location: &str) -> Option<ResolvedEntity>;
}
