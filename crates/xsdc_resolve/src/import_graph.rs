//! Breadth-first discovery of the document composition graph.

use crate::downloader::Downloader;
use crate::errors;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use xsdc_diagnostics::{DiagnosticSink, SourceLocation};
use xsdc_document::{DocId, DocumentSet, SchemaDocument};

/// One document in the translation schedule, with the namespace it is
/// compiled under.
///
/// For ordinary documents `namespace` equals the document's own target
/// namespace. For chameleon documents it is the adopting includer's
/// namespace, and the same document may appear several times under
/// different namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// The document to translate.
    pub doc: DocId,
    /// The effective namespace, `""` when there is none.
    pub namespace: String,
}

/// A `redefine` clause edge: `redefining` reinterprets components of
/// `redefined`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedefineEdge {
    /// The document carrying the `redefine` clause.
    pub redefining: DocId,
    /// The document whose components are redefined.
    pub redefined: DocId,
    /// The namespace both sides are compiled under.
    pub namespace: String,
}

/// The outcome of graph discovery: every reachable document with its
/// effective namespace, in discovery order, plus the inclusion relation
/// needed to order redefinitions.
pub struct ResolvedGraph {
    /// All documents pulled in, including ones that failed namespace checks.
    pub docs: DocumentSet,
    /// Documents to translate, in breadth-first discovery order.
    pub schedule: Vec<ScheduleEntry>,
    /// All `redefine` edges discovered.
    pub redefine_edges: Vec<RedefineEdge>,
    include_graph: DiGraphMap<u32, ()>,
}

impl ResolvedGraph {
    /// Returns `true` if `from` reaches `to` through zero or more
    /// `include`/`redefine` clauses.
    pub fn indirectly_includes(&self, from: DocId, to: DocId) -> bool {
        if from == to {
            return true;
        }
        if !self.include_graph.contains_node(from.as_raw()) {
            return false;
        }
        let mut dfs = Dfs::new(&self.include_graph, from.as_raw());
        while let Some(node) = dfs.next(&self.include_graph) {
            if node == to.as_raw() {
                return true;
            }
        }
        false
    }
}

/// Walks `import`/`include`/`redefine` clauses breadth-first from a set of
/// root documents, downloading referenced documents on demand.
pub struct ImportGraphResolver<'a> {
    downloader: Downloader<'a>,
    sink: &'a DiagnosticSink,
    schedule: Vec<ScheduleEntry>,
    scheduled: HashSet<(DocId, String)>,
    consumed: HashSet<DocId>,
    include_graph: DiGraphMap<u32, ()>,
    redefine_edges: Vec<RedefineEdge>,
    queue: VecDeque<(DocId, String)>,
}

impl<'a> ImportGraphResolver<'a> {
    /// Creates a resolver over the given downloader.
    pub fn new(downloader: Downloader<'a>, sink: &'a DiagnosticSink) -> Self {
        Self {
            downloader,
            sink,
            schedule: Vec::new(),
            scheduled: HashSet::new(),
            consumed: HashSet::new(),
            include_graph: DiGraphMap::new(),
            redefine_edges: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    /// Adds a root document. Roots are compiled under their own target
    /// namespace, empty for namespace-less roots.
    pub fn add_root(&mut self, doc: SchemaDocument) -> DocId {
        let ns = doc.namespace_or_empty().to_string();
        let id = self.downloader.add_initial(doc);
        self.enqueue(id, ns);
        id
    }

    /// Drains the worklist and returns the discovered graph.
    ///
    /// Chameleon documents that were downloaded but never adopted by any
    /// includer are reseeded under the empty namespace, repeatedly, until
    /// every document is scheduled at least once.
    pub fn resolve_all(mut self) -> ResolvedGraph {
        self.drain();
        loop {
            let orphans: Vec<DocId> = self
                .downloader
                .docs()
                .iter()
                .filter(|(id, doc)| {
                    doc.is_chameleon_candidate() && !self.consumed.contains(id)
                })
                .map(|(id, _)| id)
                .collect();
            if orphans.is_empty() {
                break;
            }
            for id in orphans {
                self.enqueue(id, String::new());
            }
            self.drain();
        }
        ResolvedGraph {
            docs: self.downloader.into_docs(),
            schedule: self.schedule,
            redefine_edges: self.redefine_edges,
            include_graph: self.include_graph,
        }
    }

    fn enqueue(&mut self, id: DocId, namespace: String) {
        if self.scheduled.insert((id, namespace.clone())) {
            self.consumed.insert(id);
            self.schedule.push(ScheduleEntry {
                doc: id,
                namespace: namespace.clone(),
            });
            self.queue.push_back((id, namespace));
        }
    }

    fn drain(&mut self) {
        while let Some((id, ns)) = self.queue.pop_front() {
            self.visit(id, &ns);
        }
    }

    fn visit(&mut self, id: DocId, effective_ns: &str) {
        let doc: Arc<SchemaDocument> = Arc::clone(self.downloader.docs().get(id));
        let url = doc.properties.source_url.clone();

        for imp in &doc.imports {
            let Some(location) = imp.location.as_deref() else {
                // No location hint: the namespace must come from another
                // composition path or the external linker.
                continue;
            };
            let hint = imp.namespace.as_deref();
            let Some(child) = self.downloader.resolve(Some(&url), hint, location) else {
                continue;
            };
            let child_doc = Arc::clone(self.downloader.docs().get(child));
            let declared = imp.namespace.as_deref().unwrap_or("");
            let actual = child_doc.namespace_or_empty();
            if declared != actual {
                self.sink.emit(errors::import_namespace_mismatch(
                    declared,
                    actual,
                    clause_location(&url, imp.line),
                ));
            }
            // Imported documents always keep their own namespace.
            self.enqueue(child, actual.to_string());
        }

        for inc in &doc.includes {
            if let Some((child, ns)) = self.resolve_included(id, effective_ns, &url, &inc.location, inc.line) {
                self.enqueue(child, ns);
            }
        }

        for red in &doc.redefines {
            if let Some((child, ns)) = self.resolve_included(id, effective_ns, &url, &red.location, red.line) {
                self.redefine_edges.push(RedefineEdge {
                    redefining: id,
                    redefined: child,
                    namespace: ns.clone(),
                });
                self.enqueue(child, ns);
            }
        }
    }

    /// Shared `include`/`redefine` handling: fetch, then apply the
    /// same-namespace-or-chameleon rule.
    fn resolve_included(
        &mut self,
        parent: DocId,
        effective_ns: &str,
        parent_url: &str,
        location: &str,
        line: Option<u32>,
    ) -> Option<(DocId, String)> {
        let hint = if effective_ns.is_empty() {
            None
        } else {
            Some(effective_ns)
        };
        let child = self.downloader.resolve(Some(parent_url), hint, location)?;
        let child_doc = Arc::clone(self.downloader.docs().get(child));
        let ns = if child_doc.is_chameleon_candidate() {
            // Chameleon adoption: the document takes the includer's
            // effective namespace.
            effective_ns.to_string()
        } else if child_doc.namespace_or_empty() == effective_ns {
            effective_ns.to_string()
        } else {
            self.sink.emit(errors::include_namespace_mismatch(
                effective_ns,
                child_doc.namespace_or_empty(),
                clause_location(parent_url, line),
            ));
            return None;
        };
        self.include_graph.add_edge(parent.as_raw(), child.as_raw(), ());
        Some((child, ns))
    }
}

fn clause_location(url: &str, line: Option<u32>) -> SourceLocation {
    match line {
        Some(line) => SourceLocation::at(url, line, None),
        None => SourceLocation::document(url),
    }
}
