//! Structural translation of scheduled documents into schema components.
//!
//! The translator runs three passes over a resolved document graph.
//! The declaration pass turns every top-level declaration into an
//! immutable [`SchemaComponent`] whose cross-references are unresolved
//! [`Ref`] keys, qualified under the document's effective (possibly
//! chameleon) namespace. The redefinition pass orders each redefined
//! name's clauses base first and threads the chain through
//! `redefined_from` links. The link pass resolves every reference
//! through the compile context, which is where dependency edges are
//! recorded and unresolved references are reported.

use std::collections::HashMap;
use std::sync::Arc;
use xsdc_common::QName;
use xsdc_diagnostics::SourceLocation;
use xsdc_document::{
    AttributeDecl, AttributeGroupDecl, ElementDecl, IdentityCategory, IdentityConstraintDecl,
    ModelGroupDecl, RawQName, TypeDecl,
};
use xsdc_resolve::errors::redefined_not_found;
use xsdc_resolve::{sort_redefinitions, RedefineCandidate, ResolvedGraph, ScheduleEntry};
use xsdc_state::CompileContext;
use xsdc_types::{
    any_type, ComponentKind, ComponentPayload, ConstraintCategory, LocalAttribute, Particle, Ref,
    SchemaComponent,
};

use crate::errors;

/// A redefining declaration, kept with its site for the ordering pass.
enum RedefDecl {
    Type(TypeDecl),
    ModelGroup(ModelGroupDecl),
    AttributeGroup(AttributeGroupDecl),
}

struct RedefSite {
    candidate: RedefineCandidate,
    decl: RedefDecl,
    namespace: String,
    url: String,
}

/// Translates a resolved document graph into the compile context.
pub struct Translator<'s, 'a> {
    ctx: &'s mut CompileContext<'a>,
    produced: Vec<Arc<SchemaComponent>>,
    redefines: HashMap<(ComponentKind, QName), Vec<RedefSite>>,
}

impl<'s, 'a> Translator<'s, 'a> {
    /// Creates a translator writing into `ctx`.
    pub fn new(ctx: &'s mut CompileContext<'a>) -> Self {
        Self {
            ctx,
            produced: Vec::new(),
            redefines: HashMap::new(),
        }
    }

    /// Runs all three passes over the graph's schedule.
    pub fn translate(&mut self, graph: &ResolvedGraph) {
        for (index, entry) in graph.schedule.iter().enumerate() {
            self.translate_document(graph, index, entry);
        }
        self.apply_redefinitions(graph);
        self.link_references();
    }

    fn translate_document(&mut self, graph: &ResolvedGraph, index: usize, entry: &ScheduleEntry) {
        let doc = Arc::clone(graph.docs.get(entry.doc));
        let ns = entry.namespace.clone();
        let url = doc.properties.source_url.clone();

        self.ctx.touch_namespace(&ns);
        self.ctx.tracker_mut().register_contribution(&ns, &url);

        for decl in &doc.types {
            if let Some(c) = self.build_type(decl, &ns, &url) {
                self.add(c);
            }
        }
        for decl in &doc.elements {
            if let Some(c) = self.build_element(decl, &ns, &url) {
                self.add(c);
            }
        }
        for decl in &doc.attributes {
            if let Some(c) = self.build_attribute(decl, &ns, &url) {
                self.add(c);
            }
        }
        for decl in &doc.model_groups {
            if let Some(c) = self.build_model_group(decl, &ns, &url) {
                self.add(c);
            }
        }
        for decl in &doc.attribute_groups {
            if let Some(c) = self.build_attribute_group(decl, &ns, &url) {
                self.add(c);
            }
        }
        for decl in &doc.identity_constraints {
            if let Some(c) = self.build_identity_constraint(decl, &ns, &url) {
                self.add(c);
            }
        }

        for clause in &doc.redefines {
            let candidate = RedefineCandidate {
                schedule_index: index,
                doc: entry.doc,
            };
            for decl in &clause.types {
                if let Some(name) = &decl.name {
                    self.redefine_site(
                        ComponentKind::Type,
                        QName::new(&ns, name.clone()),
                        RedefSite {
                            candidate,
                            decl: RedefDecl::Type(decl.clone()),
                            namespace: ns.clone(),
                            url: url.clone(),
                        },
                    );
                } else {
                    self.ctx
                        .sink()
                        .emit(errors::malformed_name("type", loc(&url, decl.line)));
                }
            }
            for decl in &clause.model_groups {
                if let Some(name) = &decl.name {
                    self.redefine_site(
                        ComponentKind::ModelGroup,
                        QName::new(&ns, name.clone()),
                        RedefSite {
                            candidate,
                            decl: RedefDecl::ModelGroup(decl.clone()),
                            namespace: ns.clone(),
                            url: url.clone(),
                        },
                    );
                } else {
                    self.ctx
                        .sink()
                        .emit(errors::malformed_name("model group", loc(&url, decl.line)));
                }
            }
            for decl in &clause.attribute_groups {
                if let Some(name) = &decl.name {
                    self.redefine_site(
                        ComponentKind::AttributeGroup,
                        QName::new(&ns, name.clone()),
                        RedefSite {
                            candidate,
                            decl: RedefDecl::AttributeGroup(decl.clone()),
                            namespace: ns.clone(),
                            url: url.clone(),
                        },
                    );
                } else {
                    self.ctx.sink().emit(errors::malformed_name(
                        "attribute group",
                        loc(&url, decl.line),
                    ));
                }
            }
        }
    }

    fn redefine_site(&mut self, kind: ComponentKind, name: QName, site: RedefSite) {
        self.redefines.entry((kind, name)).or_default().push(site);
    }

    fn add(&mut self, component: Arc<SchemaComponent>) {
        if self.ctx.add(component.clone(), None) {
            self.produced.push(component);
        }
    }

    fn build_type(&mut self, decl: &TypeDecl, ns: &str, url: &str) -> Option<Arc<SchemaComponent>> {
        let Some(name) = &decl.name else {
            self.ctx
                .sink()
                .emit(errors::malformed_name("type", loc(url, decl.line)));
            return None;
        };
        let base = decl
            .base
            .as_ref()
            .map(|b| Ref::new(ComponentKind::Type, qname_of(b, ns)));
        Some(Arc::new(SchemaComponent::new(
            QName::new(ns, name.clone()),
            ComponentPayload::Type {
                is_complex: decl.is_complex,
                base,
            },
            url,
        )))
    }

    fn build_element(
        &mut self,
        decl: &ElementDecl,
        ns: &str,
        url: &str,
    ) -> Option<Arc<SchemaComponent>> {
        let Some(name) = &decl.name else {
            self.ctx
                .sink()
                .emit(errors::malformed_name("element", loc(url, decl.line)));
            return None;
        };
        let ty = self.declared_type(name, &decl.ty, &decl.nested_type, ns, url, decl.line);
        Some(Arc::new(SchemaComponent::new(
            QName::new(ns, name.clone()),
            ComponentPayload::Element { ty },
            url,
        )))
    }

    fn build_attribute(
        &mut self,
        decl: &AttributeDecl,
        ns: &str,
        url: &str,
    ) -> Option<Arc<SchemaComponent>> {
        let Some(name) = &decl.name else {
            self.ctx
                .sink()
                .emit(errors::malformed_name("attribute", loc(url, decl.line)));
            return None;
        };
        let ty = self.declared_type(name, &decl.ty, &decl.nested_type, ns, url, decl.line);
        Some(Arc::new(SchemaComponent::new(
            QName::new(ns, name.clone()),
            ComponentPayload::Attribute { ty },
            url,
        )))
    }

    /// Resolves the declared-type shape shared by elements and attributes:
    /// a `type` reference, an anonymous nested definition, both (a
    /// conflict, recovered with the any-type), or neither (the any-type).
    fn declared_type(
        &mut self,
        owner_local: &str,
        ty: &Option<RawQName>,
        nested: &Option<TypeDecl>,
        ns: &str,
        url: &str,
        line: Option<u32>,
    ) -> Ref {
        match (ty, nested) {
            (Some(_), Some(_)) => {
                self.ctx
                    .sink()
                    .emit(errors::ref_and_nested_conflict(owner_local, loc(url, line)));
                Ref::resolved_to(any_type())
            }
            (Some(raw), None) => Ref::new(ComponentKind::Type, qname_of(raw, ns)),
            (None, Some(nested)) => self.anonymous_type(owner_local, nested, ns, url),
            (None, None) => Ref::resolved_to(any_type()),
        }
    }

    /// Hoists an anonymous nested type into a named component,
    /// `<owner>$anon`, so it has a handle and a container slot.
    fn anonymous_type(&mut self, owner_local: &str, decl: &TypeDecl, ns: &str, url: &str) -> Ref {
        let base = decl
            .base
            .as_ref()
            .map(|b| Ref::new(ComponentKind::Type, qname_of(b, ns)));
        let anon = Arc::new(SchemaComponent::new(
            QName::new(ns, format!("{owner_local}$anon")),
            ComponentPayload::Type {
                is_complex: decl.is_complex,
                base,
            },
            url,
        ));
        self.add(anon.clone());
        Ref::resolved_to(anon)
    }

    fn build_model_group(
        &mut self,
        decl: &ModelGroupDecl,
        ns: &str,
        url: &str,
    ) -> Option<Arc<SchemaComponent>> {
        let Some(name) = &decl.name else {
            self.ctx
                .sink()
                .emit(errors::malformed_name("model group", loc(url, decl.line)));
            return None;
        };
        Some(Arc::new(SchemaComponent::new(
            QName::new(ns, name.clone()),
            self.model_group_payload(decl, ns),
            url,
        )))
    }

    fn model_group_payload(&mut self, decl: &ModelGroupDecl, ns: &str) -> ComponentPayload {
        let particles = decl
            .particles
            .iter()
            .map(|p| Particle {
                name: p.name.clone(),
                ty: match &p.ty {
                    Some(raw) => Ref::new(ComponentKind::Type, qname_of(raw, ns)),
                    None => Ref::resolved_to(any_type()),
                },
            })
            .collect();
        let group_refs = decl
            .group_refs
            .iter()
            .map(|g| Ref::new(ComponentKind::ModelGroup, qname_of(g, ns)))
            .collect();
        ComponentPayload::ModelGroup {
            particles,
            group_refs,
        }
    }

    fn build_attribute_group(
        &mut self,
        decl: &AttributeGroupDecl,
        ns: &str,
        url: &str,
    ) -> Option<Arc<SchemaComponent>> {
        let Some(name) = &decl.name else {
            self.ctx
                .sink()
                .emit(errors::malformed_name("attribute group", loc(url, decl.line)));
            return None;
        };
        Some(Arc::new(SchemaComponent::new(
            QName::new(ns, name.clone()),
            self.attribute_group_payload(decl, ns, url),
            url,
        )))
    }

    fn attribute_group_payload(
        &mut self,
        decl: &AttributeGroupDecl,
        ns: &str,
        url: &str,
    ) -> ComponentPayload {
        let mut attributes = Vec::with_capacity(decl.attributes.len());
        for attr in &decl.attributes {
            let Some(name) = &attr.name else {
                self.ctx
                    .sink()
                    .emit(errors::malformed_name("attribute", loc(url, attr.line)));
                continue;
            };
            let ty = self.declared_type(name, &attr.ty, &attr.nested_type, ns, url, attr.line);
            attributes.push(LocalAttribute {
                name: name.clone(),
                ty,
            });
        }
        let group_refs = decl
            .group_refs
            .iter()
            .map(|g| Ref::new(ComponentKind::AttributeGroup, qname_of(g, ns)))
            .collect();
        ComponentPayload::AttributeGroup {
            attributes,
            group_refs,
        }
    }

    fn build_identity_constraint(
        &mut self,
        decl: &IdentityConstraintDecl,
        ns: &str,
        url: &str,
    ) -> Option<Arc<SchemaComponent>> {
        let Some(name) = &decl.name else {
            self.ctx.sink().emit(errors::malformed_name(
                "identity constraint",
                loc(url, decl.line),
            ));
            return None;
        };
        let refer = decl
            .refer
            .as_ref()
            .map(|r| Ref::new(ComponentKind::IdentityConstraint, qname_of(r, ns)));
        Some(Arc::new(SchemaComponent::new(
            QName::new(ns, name.clone()),
            ComponentPayload::IdentityConstraint {
                category: constraint_category(decl.category),
                selector: decl.selector.clone(),
                fields: decl.fields.clone(),
                refer,
            },
            url,
        )))
    }

    /// Orders and applies every collected redefinition chain.
    fn apply_redefinitions(&mut self, graph: &ResolvedGraph) {
        let mut redefines: Vec<_> = std::mem::take(&mut self.redefines).into_iter().collect();
        // deterministic application order across names
        redefines.sort_by(|a, b| {
            (a.0 .0.code(), &a.0 .1.namespace, &a.0 .1.local)
                .cmp(&(b.0 .0.code(), &b.0 .1.namespace, &b.0 .1.local))
        });

        for ((kind, name), sites) in redefines {
            let candidates: Vec<RedefineCandidate> = sites.iter().map(|s| s.candidate).collect();
            let chain = sort_redefinitions(&name.to_string(), candidates, graph, self.ctx.sink());

            let mut prior = match self.ctx.find(kind, &name, None, None) {
                Some(p) => p,
                None => {
                    let first = &sites[0];
                    self.ctx.sink().emit(redefined_not_found(
                        kind.label(),
                        &name.to_string(),
                        SourceLocation::document(first.url.clone()),
                    ));
                    continue;
                }
            };

            for cand in chain {
                let Some(site) = sites
                    .iter()
                    .find(|s| s.candidate.schedule_index == cand.schedule_index)
                else {
                    continue;
                };
                let derived = self.build_redefinition(&name, site, &prior);
                if self.ctx.add(derived.clone(), Some(&prior)) {
                    self.produced.push(derived.clone());
                    prior = derived;
                }
            }
        }
    }

    /// Builds one link of a redefinition chain. A redefining type that
    /// derives from its own name derives from the prior link.
    fn build_redefinition(
        &mut self,
        name: &QName,
        site: &RedefSite,
        prior: &Arc<SchemaComponent>,
    ) -> Arc<SchemaComponent> {
        let ns = &site.namespace;
        let payload = match &site.decl {
            RedefDecl::Type(decl) => {
                let base = match &decl.base {
                    Some(raw) if &qname_of(raw, ns) == name => {
                        Some(Ref::resolved_to(prior.clone()))
                    }
                    Some(raw) => Some(Ref::new(ComponentKind::Type, qname_of(raw, ns))),
                    None => Some(Ref::resolved_to(prior.clone())),
                };
                ComponentPayload::Type {
                    is_complex: decl.is_complex,
                    base,
                }
            }
            RedefDecl::ModelGroup(decl) => self.model_group_payload(decl, ns),
            RedefDecl::AttributeGroup(decl) => self.attribute_group_payload(decl, ns, &site.url),
        };
        let mut component = SchemaComponent::new(name.clone(), payload, site.url.clone());
        component.redefined_from = Some(Ref::resolved_to(prior.clone()));
        Arc::new(component)
    }

    /// Resolves every unresolved reference of every component this
    /// compile produced, recording dependency edges and reporting the
    /// references nothing will ever satisfy.
    fn link_references(&mut self) {
        let produced = std::mem::take(&mut self.produced);
        for component in &produced {
            let source_ns = component.namespace().to_string();
            let url = component.source_url.clone();
            match &component.payload {
                ComponentPayload::Type { base, .. } => {
                    if let Some(r) = base {
                        self.link_one(r, &source_ns, &url);
                    }
                }
                ComponentPayload::Element { ty } | ComponentPayload::Attribute { ty } => {
                    self.link_one(ty, &source_ns, &url);
                }
                ComponentPayload::ModelGroup {
                    particles,
                    group_refs,
                } => {
                    for p in particles {
                        self.link_one(&p.ty, &source_ns, &url);
                    }
                    for g in group_refs {
                        self.link_one(g, &source_ns, &url);
                    }
                }
                ComponentPayload::AttributeGroup {
                    attributes,
                    group_refs,
                } => {
                    for a in attributes {
                        self.link_one(&a.ty, &source_ns, &url);
                    }
                    for g in group_refs {
                        self.link_one(g, &source_ns, &url);
                    }
                }
                ComponentPayload::IdentityConstraint { refer, .. } => {
                    if let Some(r) = refer {
                        self.link_one(r, &source_ns, &url);
                    }
                }
            }
        }
    }

    fn link_one(&mut self, r: &Ref, source_ns: &str, url: &str) {
        if r.get().is_some() {
            return;
        }
        let key = r.key().clone();
        match self.ctx.find(key.kind, &key.name, None, Some(source_ns)) {
            Some(found) => {
                r.bind(found);
            }
            None => {
                let hint = self
                    .ctx
                    .spelling_hint(&key.name.local)
                    .map(|e| (&e.name, e.defined_in.as_str()));
                self.ctx.sink().emit(errors::unresolved_reference(
                    key.kind.label(),
                    &key.name,
                    SourceLocation::document(url),
                    hint,
                ));
            }
        }
    }
}

fn qname_of(raw: &RawQName, effective_ns: &str) -> QName {
    match &raw.namespace {
        Some(ns) => QName::new(ns.clone(), raw.local.clone()),
        None => QName::new(effective_ns, raw.local.clone()),
    }
}

fn constraint_category(category: IdentityCategory) -> ConstraintCategory {
    match category {
        IdentityCategory::Key => ConstraintCategory::Key,
        IdentityCategory::KeyRef => ConstraintCategory::KeyRef,
        IdentityCategory::Unique => ConstraintCategory::Unique,
    }
}

fn loc(url: &str, line: Option<u32>) -> SourceLocation {
    match line {
        Some(line) => SourceLocation::at(url, line, None),
        None => SourceLocation::document(url),
    }
}
