//! Linearization of the redefinitions of one component name.
//!
//! Several documents in one namespace may carry a `redefine` clause for
//! the same name. The clauses form a derivation chain only if the
//! redefining documents include one another (directly or indirectly); the
//! chain must then be applied base first. This module orders the
//! candidates by the inclusion relation, reports cycles and unrelated
//! redefinitions, and returns the applicable chain.

use crate::errors;
use crate::import_graph::ResolvedGraph;
use xsdc_diagnostics::DiagnosticSink;
use xsdc_document::DocId;

/// One document that redefines a particular component name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedefineCandidate {
    /// Index into the caller's translation schedule, for retrieving the
    /// clause after ordering.
    pub schedule_index: usize,
    /// The redefining document.
    pub doc: DocId,
}

/// Orders the redefinitions of `name` base first.
///
/// A candidate is base-most when it includes no other remaining
/// candidate, so candidates are extracted by repeatedly removing one with
/// zero inclusions among the rest. A cycle (no zero-count candidate) is
/// reported once per name and broken at the least-including candidate.
/// After ordering, each candidate must include its predecessor in the
/// chain; one that does not is an unrelated redefinition and is dropped.
pub fn sort_redefinitions(
    name: &str,
    candidates: Vec<RedefineCandidate>,
    graph: &ResolvedGraph,
    sink: &DiagnosticSink,
) -> Vec<RedefineCandidate> {
    if candidates.len() <= 1 {
        return candidates;
    }

    let mut remaining = candidates;
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut cycle_reported = false;
    while !remaining.is_empty() {
        let counts: Vec<usize> = remaining
            .iter()
            .enumerate()
            .map(|(i, c)| {
                remaining
                    .iter()
                    .enumerate()
                    .filter(|&(j, o)| j != i && graph.indirectly_includes(c.doc, o.doc))
                    .count()
            })
            .collect();
        let pick = match counts.iter().position(|&n| n == 0) {
            Some(i) => i,
            None => {
                if !cycle_reported {
                    let participants: Vec<String> = remaining
                        .iter()
                        .map(|c| graph.docs.get(c.doc).properties.source_url.clone())
                        .collect();
                    sink.emit(errors::circular_redefinition(name, &participants));
                    cycle_reported = true;
                }
                least_including(&counts)
            }
        };
        ordered.push(remaining.remove(pick));
    }

    let mut chain: Vec<RedefineCandidate> = Vec::with_capacity(ordered.len());
    for cand in ordered {
        if let Some(prev) = chain.last() {
            if !graph.indirectly_includes(cand.doc, prev.doc) {
                let url = &graph.docs.get(cand.doc).properties.source_url;
                sink.emit(errors::multiple_redefinition(name, url));
                continue;
            }
        }
        chain.push(cand);
    }
    chain
}

fn least_including(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .min_by_key(|&(_, n)| n)
        .map(|(i, _)| i)
        .unwrap_or(0)
}
