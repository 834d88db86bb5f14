//! The top-level compile entry point.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use xsdc_common::InternalError;
use xsdc_config::CompilerConfig;
use xsdc_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use xsdc_document::{DocumentParser, EntityResolver, SchemaDocument};
use xsdc_resolve::{Downloader, ImportGraphResolver};
use xsdc_state::{CompileContext, DependencyTracker};
use xsdc_types::{SchemaTypeLoader, TypeSystem};

use crate::translator::Translator;

/// A previous build carried into an incremental recompile: the type
/// system it produced and its dependency tracker (typically restored
/// from the build manifest).
pub struct PriorBuild {
    /// The previously built type system.
    pub system: TypeSystem,
    /// The dependency tracker of that build.
    pub tracker: DependencyTracker,
}

/// What a compile yields besides diagnostics.
pub struct CompileOutput {
    /// The resolved type system. `None` when every error was recovered
    /// but partial type systems are disabled.
    pub system: Option<TypeSystem>,
    /// The dependency tracker of this build, for manifest persistence.
    pub tracker: DependencyTracker,
}

/// An unrecoverable compile failure.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// At least one reported error was not recovered.
    #[error("compilation failed: {first}")]
    Failed {
        /// The first unrecovered error diagnostic.
        first: Diagnostic,
    },
    /// An internal consistency check failed.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Compiles a set of parsed schema documents into a resolved type system.
///
/// Diagnostics go to `sink`; only an unrecovered error (or an internal
/// inconsistency) becomes an `Err`. When `existing` is given, the
/// namespaces this compile touches are rebuilt and every other namespace
/// of the prior system is carried forward unchanged, with the prior
/// tracker's data for the rebuilt namespaces excised and re-registered.
#[allow(clippy::too_many_arguments)]
pub fn compile(
    existing: Option<PriorBuild>,
    name: &str,
    documents: Vec<SchemaDocument>,
    link_to: Option<Arc<dyn SchemaTypeLoader>>,
    config: &CompilerConfig,
    parser: &dyn DocumentParser,
    entity_resolver: Option<&dyn EntityResolver>,
    sink: &DiagnosticSink,
) -> Result<CompileOutput, CompileError> {
    let graph = {
        let downloader = Downloader::new(
            &config.download,
            parser,
            entity_resolver,
            link_to.as_deref(),
            sink,
        );
        let mut walker = ImportGraphResolver::new(downloader, sink);
        for doc in documents {
            walker.add_root(doc);
        }
        walker.resolve_all()
    };

    let stale: HashSet<String> = graph
        .schedule
        .iter()
        .map(|e| e.namespace.clone())
        .collect();

    let tracker = match &existing {
        Some(prior) => prior.tracker.without_namespaces(&stale),
        None => DependencyTracker::new(),
    };

    let mut ctx = CompileContext::new(config.schema.clone(), link_to.clone(), tracker, sink);
    if let Some(prior) = existing {
        let carried: HashMap<_, _> = prior
            .system
            .into_containers()
            .into_iter()
            .filter(|(ns, _)| !stale.contains(ns))
            .collect();
        ctx.carry_forward(carried);
    }

    Translator::new(&mut ctx).translate(&graph);
    ctx.verify_containers()?;

    let has_errors = sink.has_errors();
    if has_errors && !sink.all_recovered() {
        let first = sink
            .diagnostics()
            .into_iter()
            .find(|d| d.severity == Severity::Error && !d.recovered)
            .ok_or_else(|| {
                InternalError::new("unrecovered error counted but no such diagnostic collected")
            })?;
        return Err(CompileError::Failed { first });
    }

    let (containers, tracker, _redefined) = ctx.into_parts(name);
    if has_errors && !config.schema.partial_types {
        return Ok(CompileOutput {
            system: None,
            tracker,
        });
    }
    Ok(CompileOutput {
        system: Some(TypeSystem::new(name, containers, has_errors, link_to)),
        tracker,
    })
}
