//! Digest cache and schema document downloader.

use crate::errors;
use crate::urls::{resolve_location, scheme_of};
use std::collections::{HashMap, HashSet};
use url::Url;
use xsdc_common::ContentHash;
use xsdc_config::DownloadConfig;
use xsdc_diagnostics::{DiagnosticSink, SourceLocation};
use xsdc_document::{
    DocId, DocumentParser, DocumentSet, EntityResolver, ResolvedEntity, SchemaDocument,
};
use xsdc_types::SchemaTypeLoader;

/// How many entity-resolver redirects to follow before giving up.
const MAX_REDIRECTS: usize = 8;

/// Fetches and deduplicates schema documents.
///
/// Documents are cached under three identities: `(namespace, URL)`, plain
/// URL, and content digest. A byte-identical document fetched from two
/// different URLs is one logical document. Failures are reported once per
/// URL and remembered so repeated references stay silent.
pub struct Downloader<'a> {
    config: &'a DownloadConfig,
    parser: &'a dyn DocumentParser,
    entity_resolver: Option<&'a dyn EntityResolver>,
    linker: Option<&'a dyn SchemaTypeLoader>,
    sink: &'a DiagnosticSink,
    docs: DocumentSet,
    by_ns_url: HashMap<(String, String), DocId>,
    by_url: HashMap<String, DocId>,
    by_digest: HashMap<ContentHash, DocId>,
    /// First document seen per non-empty namespace; the offline fallback.
    by_namespace: HashMap<String, DocId>,
    failed: HashSet<String>,
}

impl<'a> Downloader<'a> {
    /// Creates a downloader with the given policy and collaborators.
    pub fn new(
        config: &'a DownloadConfig,
        parser: &'a dyn DocumentParser,
        entity_resolver: Option<&'a dyn EntityResolver>,
        linker: Option<&'a dyn SchemaTypeLoader>,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            config,
            parser,
            entity_resolver,
            linker,
            sink,
            docs: DocumentSet::new(),
            by_ns_url: HashMap::new(),
            by_url: HashMap::new(),
            by_digest: HashMap::new(),
            by_namespace: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    /// Seeds an already-parsed document (one of the compile's inputs) into
    /// the cache and returns its ID.
    pub fn add_initial(&mut self, doc: SchemaDocument) -> DocId {
        let url = doc.properties.source_url.clone();
        let digest = doc.properties.digest;
        let ns = doc.namespace_or_empty().to_string();
        if let Some(&existing) = self.by_digest.get(&digest) {
            self.by_url.entry(url.clone()).or_insert(existing);
            self.by_ns_url.entry((ns, url)).or_insert(existing);
            return existing;
        }
        let id = self.docs.add(doc);
        self.register(id, &ns, &url, digest);
        id
    }

    /// The documents pulled in so far.
    pub fn docs(&self) -> &DocumentSet {
        &self.docs
    }

    /// Consumes the downloader, yielding the document set.
    pub fn into_docs(self) -> DocumentSet {
        self.docs
    }

    /// Resolves one schema reference to a document.
    ///
    /// First match wins: (a) exact `(namespace, URL)` already downloaded;
    /// (b) downloads disabled for the URL's scheme and the namespace is
    /// already represented by some file — reuse it silently; (c) the
    /// external linker already defines the namespace — skip with no error;
    /// (d) exact URL match regardless of namespace; (e) download,
    /// validate, and deduplicate by content digest. Returns `None` on
    /// failure (reported once per URL) and for case (c).
    pub fn resolve(
        &mut self,
        referencing_url: Option<&str>,
        namespace_hint: Option<&str>,
        location: &str,
    ) -> Option<DocId> {
        let base = referencing_url.or(self.config.base_uri.as_deref());
        let absolute = match resolve_location(base, location) {
            Ok(url) => url,
            Err(err) => {
                self.report_failure(location, &err.to_string(), referencing_url);
                return None;
            }
        };

        if let Some(ns) = namespace_hint {
            if let Some(&id) = self.by_ns_url.get(&(ns.to_string(), absolute.clone())) {
                return Some(id);
            }

            let offline = scheme_of(&absolute)
                .is_some_and(|s| self.config.is_scheme_disabled(s));
            if offline {
                if let Some(&id) = self.by_namespace.get(ns) {
                    // Namespace wins over the literal URL when offline.
                    return Some(id);
                }
            }

            if let Some(linker) = self.linker {
                if linker.is_namespace_defined(ns) {
                    // The linked definition is authoritative; nothing to do.
                    return None;
                }
            }
        }

        if let Some(&id) = self.by_url.get(&absolute) {
            return Some(id);
        }

        self.download(&absolute, namespace_hint, referencing_url)
    }

    fn download(
        &mut self,
        absolute: &str,
        namespace_hint: Option<&str>,
        referencing_url: Option<&str>,
    ) -> Option<DocId> {
        if self.failed.contains(absolute) {
            return None;
        }

        let mut target = absolute.to_string();
        let mut bytes = None;
        for _ in 0..MAX_REDIRECTS {
            match self.fetch(&target, namespace_hint) {
                Ok(Fetched::Bytes(b)) => {
                    bytes = Some(b);
                    break;
                }
                Ok(Fetched::Redirect(next)) => {
                    match resolve_location(Some(&target), &next) {
                        Ok(url) => target = url,
                        Err(err) => {
                            self.report_failure(absolute, &err.to_string(), referencing_url);
                            return None;
                        }
                    }
                    if let Some(&id) = self.by_url.get(&target) {
                        self.alias(id, namespace_hint, absolute);
                        return Some(id);
                    }
                }
                Err(reason) => {
                    self.report_failure(absolute, &reason, referencing_url);
                    return None;
                }
            }
        }
        let Some(bytes) = bytes else {
            self.report_failure(absolute, "too many redirects", referencing_url);
            return None;
        };

        let digest = ContentHash::from_bytes(&bytes);
        if let Some(&id) = self.by_digest.get(&digest) {
            // Byte-identical to something already loaded, possibly under a
            // different URL: reuse the original object.
            self.alias(id, namespace_hint, absolute);
            return Some(id);
        }

        let mut doc = match self.parser.parse(&bytes, &target) {
            Ok(doc) => doc,
            Err(err) => {
                self.failed.insert(absolute.to_string());
                self.sink.emit(errors::invalid_document(absolute, &err.reason));
                return None;
            }
        };
        doc.properties.source_url = absolute.to_string();
        doc.properties.digest = digest;

        let ns = namespace_hint
            .map(str::to_string)
            .unwrap_or_else(|| doc.namespace_or_empty().to_string());
        let doc_ns = doc.namespace_or_empty().to_string();
        let id = self.docs.add(doc);
        self.register(id, &doc_ns, absolute, digest);
        self.by_ns_url.insert((ns, absolute.to_string()), id);
        Some(id)
    }

    fn register(&mut self, id: DocId, doc_ns: &str, url: &str, digest: ContentHash) {
        self.by_url.insert(url.to_string(), id);
        self.by_digest.insert(digest, id);
        self.by_ns_url.insert((doc_ns.to_string(), url.to_string()), id);
        if !doc_ns.is_empty() {
            self.by_namespace.entry(doc_ns.to_string()).or_insert(id);
        }
    }

    fn alias(&mut self, id: DocId, namespace_hint: Option<&str>, url: &str) {
        self.by_url.insert(url.to_string(), id);
        if let Some(ns) = namespace_hint {
            self.by_ns_url.insert((ns.to_string(), url.to_string()), id);
        }
    }

    fn fetch(&self, url: &str, namespace_hint: Option<&str>) -> Result<Fetched, String> {
        if let Some(resolver) = self.entity_resolver {
            match resolver.resolve_entity(namespace_hint, url) {
                Some(ResolvedEntity::Bytes(b)) => return Ok(Fetched::Bytes(b)),
                Some(ResolvedEntity::Text(t)) => return Ok(Fetched::Bytes(t.into_bytes())),
                Some(ResolvedEntity::Redirect(next)) => return Ok(Fetched::Redirect(next)),
                None => {}
            }
        }

        // Direct fetch fallback. Only `file:` is supported here; network
        // transports come in through the entity resolver.
        let parsed = Url::parse(url).map_err(|e| e.to_string())?;
        if parsed.scheme() != "file" {
            return Err(format!(
                "no entity resolver handled '{url}' and scheme '{}' has no direct fetch",
                parsed.scheme()
            ));
        }
        let path = parsed
            .to_file_path()
            .map_err(|_| format!("'{url}' is not a usable file path"))?;
        std::fs::read(&path).map(Fetched::Bytes).map_err(|e| e.to_string())
    }

    fn report_failure(&mut self, url: &str, reason: &str, referencing_url: Option<&str>) {
        if self.failed.insert(url.to_string()) {
            let from = referencing_url
                .map(SourceLocation::document)
                .unwrap_or_else(SourceLocation::unknown);
            self.sink.emit(errors::download_failure(url, reason, from));
        }
    }
}

enum Fetched {
    Bytes(Vec<u8>),
    Redirect(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsdc_document::{DocumentError, DocumentProperties};

    /// Parser stub: bytes are `ns=<uri>` or empty for a chameleon doc.
    struct StubParser;

    impl DocumentParser for StubParser {
        fn parse(&self, bytes: &[u8], url: &str) -> Result<SchemaDocument, DocumentError> {
            let text = String::from_utf8_lossy(bytes);
            if text.starts_with("bad") {
                return Err(DocumentError::new(url, "stub parse failure"));
            }
            let ns = text
                .strip_prefix("ns=")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            Ok(SchemaDocument::empty(
                ns,
                DocumentProperties::new(url, ContentHash::from_bytes(bytes)),
            ))
        }
    }

    /// Entity resolver serving canned documents from a map.
    struct MapResolver(HashMap<String, Vec<u8>>);

    impl EntityResolver for MapResolver {
        fn resolve_entity(&self, _ns: Option<&str>, location: &str) -> Option<ResolvedEntity> {
            self.0.get(location).map(|b| ResolvedEntity::Bytes(b.clone()))
        }
    }

    fn config() -> DownloadConfig {
        DownloadConfig::default()
    }

    #[test]
    fn digest_dedup_across_urls() {
        let cfg = config();
        let sink = DiagnosticSink::new();
        let parser = StubParser;
        let mut entities = HashMap::new();
        entities.insert("file:///one/a.xsd".to_string(), b"ns=http://a".to_vec());
        entities.insert("file:///two/a.xsd".to_string(), b"ns=http://a".to_vec());
        let resolver = MapResolver(entities);
        let mut dl = Downloader::new(&cfg, &parser, Some(&resolver), None, &sink);

        let first = dl.resolve(None, Some("http://a"), "file:///one/a.xsd").unwrap();
        let second = dl.resolve(None, None, "file:///two/a.xsd").unwrap();
        assert_eq!(first, second, "byte-identical documents must be one object");
        assert_eq!(dl.docs().len(), 1);
    }

    #[test]
    fn failure_reported_once_per_url() {
        let cfg = config();
        let sink = DiagnosticSink::new();
        let parser = StubParser;
        let resolver = MapResolver(HashMap::new());
        let mut dl = Downloader::new(&cfg, &parser, Some(&resolver), None, &sink);

        assert!(dl.resolve(None, None, "http://unreachable/x.xsd").is_none());
        assert!(dl.resolve(None, None, "http://unreachable/x.xsd").is_none());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn invalid_document_reported_and_remembered() {
        let cfg = config();
        let sink = DiagnosticSink::new();
        let parser = StubParser;
        let mut entities = HashMap::new();
        entities.insert("file:///bad.xsd".to_string(), b"bad bytes".to_vec());
        let resolver = MapResolver(entities);
        let mut dl = Downloader::new(&cfg, &parser, Some(&resolver), None, &sink);

        assert!(dl.resolve(None, None, "file:///bad.xsd").is_none());
        assert!(dl.resolve(None, None, "file:///bad.xsd").is_none());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].code, errors::E102);
    }

    #[test]
    fn offline_namespace_reuse() {
        let cfg = DownloadConfig {
            disabled_schemes: vec!["http".to_string()],
            ..Default::default()
        };
        let sink = DiagnosticSink::new();
        let parser = StubParser;
        let mut entities = HashMap::new();
        entities.insert("file:///local/a.xsd".to_string(), b"ns=http://a".to_vec());
        let resolver = MapResolver(entities);
        let mut dl = Downloader::new(&cfg, &parser, Some(&resolver), None, &sink);

        let local = dl.resolve(None, Some("http://a"), "file:///local/a.xsd").unwrap();
        // the http location is never fetched; the namespace wins
        let reused = dl
            .resolve(None, Some("http://a"), "http://remote.example/a.xsd")
            .unwrap();
        assert_eq!(local, reused);
        assert!(!sink.has_errors());
    }

    #[test]
    fn linker_defined_namespace_is_skipped_silently() {
        struct NsLinker;
        impl SchemaTypeLoader for NsLinker {
            fn find_component(
                &self,
                _kind: xsdc_types::ComponentKind,
                _name: &xsdc_common::QName,
            ) -> Option<std::sync::Arc<xsdc_types::SchemaComponent>> {
                None
            }
            fn is_namespace_defined(&self, namespace: &str) -> bool {
                namespace == "http://linked"
            }
        }

        let cfg = config();
        let sink = DiagnosticSink::new();
        let parser = StubParser;
        let resolver = MapResolver(HashMap::new());
        let linker = NsLinker;
        let mut dl = Downloader::new(&cfg, &parser, Some(&resolver), Some(&linker), &sink);

        let r = dl.resolve(None, Some("http://linked"), "http://anywhere/x.xsd");
        assert!(r.is_none());
        assert!(!sink.has_errors());
    }

    #[test]
    fn relative_location_resolves_against_referencing_doc() {
        let cfg = config();
        let sink = DiagnosticSink::new();
        let parser = StubParser;
        let mut entities = HashMap::new();
        entities.insert("file:///schemas/b.xsd".to_string(), b"ns=http://b".to_vec());
        let resolver = MapResolver(entities);
        let mut dl = Downloader::new(&cfg, &parser, Some(&resolver), None, &sink);

        let id = dl
            .resolve(Some("file:///schemas/a.xsd"), None, "b.xsd")
            .unwrap();
        assert_eq!(dl.docs().get(id).properties.source_url, "file:///schemas/b.xsd");
    }
}
