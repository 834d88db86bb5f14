//! The per-invocation compilation context and symbol table.

use crate::deps::DependencyTracker;
use crate::errors;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use xsdc_common::{InternalError, QName, XsdcResult};
use xsdc_config::SchemaOptions;
use xsdc_diagnostics::{DiagnosticSink, SourceLocation};
use xsdc_types::{
    builtin_pool, ComponentKind, ComponentLookup, ContainerBuilder, SchemaComponent,
    SchemaTypeLoader, SealedContainer,
};

/// A spelling-index entry: where a similarly spelled component lives.
pub struct SpellingEntry {
    /// The component's qualified name.
    pub name: QName,
    /// The file that defined it.
    pub defined_in: String,
}

/// Single mutable context for one compile invocation.
///
/// Constructed per invocation and threaded explicitly through every stage;
/// a compile triggered from within another compile builds its own nested
/// context. Holds the global name maps per component kind, the container
/// builders, the redefinition chains, the mdef policy, the spelling index,
/// and the dependency tracker.
pub struct CompileContext<'a> {
    options: SchemaOptions,
    sink: &'a DiagnosticSink,
    linker: Option<Arc<dyn SchemaTypeLoader>>,
    tracker: DependencyTracker,
    builders: HashMap<String, ContainerBuilder>,
    /// Sealed containers carried forward from a prior system during an
    /// incremental rebuild. Lookups here are intra-compilation.
    carried: HashMap<String, SealedContainer>,
    globals: HashMap<(ComponentKind, QName), Arc<SchemaComponent>>,
    /// name → most-derived redefinition of that name.
    redefined: HashMap<(ComponentKind, QName), Arc<SchemaComponent>>,
    /// Prior chain links that have already been redefined, by pointer
    /// identity. Re-redefining the same link is a duplicate definition.
    redefined_priors: HashSet<usize>,
    /// Lowercased local name → first definition, for "did you mean" notes.
    spelling: HashMap<String, SpellingEntry>,
}

impl<'a> CompileContext<'a> {
    /// Creates a fresh context.
    pub fn new(
        options: SchemaOptions,
        linker: Option<Arc<dyn SchemaTypeLoader>>,
        tracker: DependencyTracker,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            options,
            sink,
            linker,
            tracker,
            builders: HashMap::new(),
            carried: HashMap::new(),
            globals: HashMap::new(),
            redefined: HashMap::new(),
            redefined_priors: HashSet::new(),
            spelling: HashMap::new(),
        }
    }

    /// Installs containers carried forward from a prior type system for an
    /// incremental rebuild. Their components stay visible to lookups, and
    /// the containers are rehomed into the new system at
    /// [`into_parts`](Self::into_parts) time.
    pub fn carry_forward(&mut self, containers: HashMap<String, SealedContainer>) {
        self.carried.extend(containers);
    }

    /// The diagnostic sink of this compile.
    pub fn sink(&self) -> &'a DiagnosticSink {
        self.sink
    }

    /// The mdef/partial-types options of this compile.
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// The dependency tracker of this compile.
    pub fn tracker(&self) -> &DependencyTracker {
        &self.tracker
    }

    /// Mutable access to the dependency tracker.
    pub fn tracker_mut(&mut self) -> &mut DependencyTracker {
        &mut self.tracker
    }

    /// Ensures a container builder exists for `namespace`, marking the
    /// namespace as touched by this compile even if it stays empty.
    pub fn touch_namespace(&mut self, namespace: &str) {
        if !self.builders.contains_key(namespace) {
            self.builders
                .insert(namespace.to_string(), ContainerBuilder::new(namespace));
        }
    }

    /// The namespaces touched by this compile (excluding carried ones).
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Looks up a component by kind and name.
    ///
    /// If `name` is in the empty namespace and `chameleon_ns` is given,
    /// the lookup happens under the chameleon namespace instead. Order:
    /// builtin pool (fixed, never tracked), the in-progress global map,
    /// carried-forward containers, then the external linker. A dependency
    /// edge `source_ns → target namespace` is registered whenever
    /// `source_ns` is given and the lookup was not satisfied externally,
    /// including lookups that fail entirely (the edge records intent to
    /// depend, at lookup time).
    pub fn find(
        &mut self,
        kind: ComponentKind,
        name: &QName,
        chameleon_ns: Option<&str>,
        source_ns: Option<&str>,
    ) -> Option<Arc<SchemaComponent>> {
        let target = if name.has_no_namespace() {
            match chameleon_ns {
                Some(ns) => QName::new(ns, name.local.clone()),
                None => name.clone(),
            }
        } else {
            name.clone()
        };

        if let Some(c) = builtin_pool().lookup(kind, &target) {
            return Some(c);
        }

        if let Some(c) = self.globals.get(&(kind, target.clone())) {
            let c = c.clone();
            self.record_edge(source_ns, &target.namespace);
            return Some(c);
        }

        if let Some(container) = self.carried.get(&target.namespace) {
            if let Some(c) = container.find(kind, &target.local) {
                let c = c.clone();
                self.record_edge(source_ns, &target.namespace);
                return Some(c);
            }
        }

        if let Some(linker) = &self.linker {
            if let Some(c) = linker.find_component(kind, &target) {
                // External dependencies are fixed; no edge.
                return Some(c);
            }
        }

        self.record_edge(source_ns, &target.namespace);
        None
    }

    fn record_edge(&mut self, source_ns: Option<&str>, target_ns: &str) {
        if let Some(source) = source_ns {
            if source != target_ns {
                self.tracker.register_dependency(source, target_ns);
            }
        }
    }

    /// Finds a global type definition.
    pub fn find_type(
        &mut self,
        name: &QName,
        chameleon_ns: Option<&str>,
        source_ns: Option<&str>,
    ) -> Option<Arc<SchemaComponent>> {
        self.find(ComponentKind::Type, name, chameleon_ns, source_ns)
    }

    /// Finds a global element declaration.
    pub fn find_element(
        &mut self,
        name: &QName,
        chameleon_ns: Option<&str>,
        source_ns: Option<&str>,
    ) -> Option<Arc<SchemaComponent>> {
        self.find(ComponentKind::Element, name, chameleon_ns, source_ns)
    }

    /// Finds a named model group.
    pub fn find_model_group(
        &mut self,
        name: &QName,
        chameleon_ns: Option<&str>,
        source_ns: Option<&str>,
    ) -> Option<Arc<SchemaComponent>> {
        self.find(ComponentKind::ModelGroup, name, chameleon_ns, source_ns)
    }

    /// Finds an identity constraint.
    pub fn find_identity_constraint(
        &mut self,
        name: &QName,
        chameleon_ns: Option<&str>,
        source_ns: Option<&str>,
    ) -> Option<Arc<SchemaComponent>> {
        self.find(ComponentKind::IdentityConstraint, name, chameleon_ns, source_ns)
    }

    /// Adds a component to the symbol table and its namespace container.
    ///
    /// For redefinitions, `redefined` is the prior link of the chain; the
    /// chain is keyed by that prior link, and re-redefining the same link
    /// is a duplicate definition. Duplicates follow the mdef policy:
    /// warning (and discard) in mdef-listed namespaces or under the
    /// blanket flag, hard error (and discard) otherwise. Returns whether
    /// the component was accepted.
    pub fn add(
        &mut self,
        component: Arc<SchemaComponent>,
        redefined: Option<&Arc<SchemaComponent>>,
    ) -> bool {
        let kind = component.kind();
        let name = component.name.clone();

        if let Some(prior) = redefined {
            let prior_ptr = Arc::as_ptr(prior) as usize;
            if !self.redefined_priors.insert(prior_ptr) {
                self.emit_duplicate(&component, &prior.source_url);
                return false;
            }
            self.insert(kind, name.clone(), component.clone());
            self.redefined.insert((kind, name), component);
            return true;
        }

        if let Some(existing) = self.globals.get(&(kind, name.clone())) {
            let first = existing.source_url.clone();
            self.emit_duplicate(&component, &first);
            return false;
        }
        self.insert(kind, name, component);
        true
    }

    fn insert(&mut self, kind: ComponentKind, name: QName, component: Arc<SchemaComponent>) {
        self.touch_namespace(&name.namespace);
        if let Some(builder) = self.builders.get_mut(&name.namespace) {
            builder.add(component.clone());
        }
        self.spelling
            .entry(name.local.to_lowercase())
            .or_insert_with(|| SpellingEntry {
                name: name.clone(),
                defined_in: component.source_url.clone(),
            });
        self.globals.insert((kind, name), component);
    }

    fn emit_duplicate(&self, component: &SchemaComponent, first_defined_in: &str) {
        let downgraded = self.options.mdef_allows(component.namespace());
        self.sink.emit(errors::duplicate_definition(
            component.kind().label(),
            &component.name.to_string(),
            first_defined_in,
            SourceLocation::document(component.source_url.clone()),
            downgraded,
        ));
    }

    /// Case-insensitive "nearest spelling" lookup for diagnostics: given a
    /// local name that failed to resolve, returns a similarly spelled
    /// definition if one exists.
    pub fn spelling_hint(&self, local: &str) -> Option<&SpellingEntry> {
        self.spelling.get(&local.to_lowercase())
    }

    /// The most-derived redefinition per redefined name.
    pub fn redefined_components(
        &self,
    ) -> impl Iterator<Item = (&(ComponentKind, QName), &Arc<SchemaComponent>)> {
        self.redefined.iter()
    }

    /// Internal consistency check: the global maps for each namespace must
    /// hold exactly the components stored in that namespace's container
    /// (redefinition chains keep their prior links in the container, under
    /// the most-derived entry).
    pub fn verify_containers(&self) -> XsdcResult<()> {
        for ((kind, name), component) in &self.globals {
            let in_container = self
                .builders
                .get(&name.namespace)
                .map(|b| b.components().any(|c| Arc::ptr_eq(c, component)))
                .unwrap_or(false);
            if !in_container {
                return Err(InternalError::new(format!(
                    "global map entry {name} ({}) missing from its container",
                    kind.label()
                )));
            }
        }
        for builder in self.builders.values() {
            for c in builder.components() {
                let key = (c.kind(), c.name.clone());
                let in_globals = self
                    .globals
                    .get(&key)
                    .map(|g| Arc::ptr_eq(g, c) || self.is_prior_link(g, c))
                    .unwrap_or(false);
                if !in_globals {
                    return Err(InternalError::new(format!(
                        "container component {} ({}) missing from the global maps",
                        c.name,
                        c.kind().label()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether `candidate` is reachable from `head` along the
    /// redefinition chain.
    fn is_prior_link(&self, head: &Arc<SchemaComponent>, candidate: &Arc<SchemaComponent>) -> bool {
        let mut current = head.clone();
        while let Some(prior) = current.redefined_from.as_ref().and_then(|r| r.get()) {
            if Arc::ptr_eq(prior, candidate) {
                return true;
            }
            current = prior.clone();
        }
        false
    }

    /// Seals every builder into an immutable container owned by `owner`,
    /// rehomes the carried containers, and yields the pieces the type
    /// system is assembled from.
    pub fn into_parts(
        self,
        owner: &str,
    ) -> (
        HashMap<String, SealedContainer>,
        DependencyTracker,
        HashMap<(ComponentKind, QName), Arc<SchemaComponent>>,
    ) {
        let mut containers: HashMap<String, SealedContainer> = self
            .builders
            .into_iter()
            .map(|(ns, b)| (ns, b.seal(owner)))
            .collect();
        for (ns, mut container) in self.carried {
            container.rehome(owner);
            containers.entry(ns).or_insert(container);
        }
        (containers, self.tracker, self.redefined)
    }
}
