//! The immutable, queryable compilation result.

use crate::builtin::builtin_pool;
use crate::component::{ComponentKind, SchemaComponent};
use crate::container::SealedContainer;
use crate::rref::ComponentLookup;
use std::collections::HashMap;
use std::sync::Arc;
use xsdc_common::QName;

/// Read-only lookup interface of an externally linked type system.
///
/// A compile may link against previously built systems; lookups satisfied
/// here are fixed external dependencies and never enter the incremental
/// dependency graph.
pub trait SchemaTypeLoader: Send + Sync {
    /// Finds a component of the given kind and name.
    fn find_component(&self, kind: ComponentKind, name: &QName) -> Option<Arc<SchemaComponent>>;

    /// Returns `true` if this loader defines any component in `namespace`.
    fn is_namespace_defined(&self, namespace: &str) -> bool;

    /// Finds a global type definition.
    fn find_type(&self, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.find_component(ComponentKind::Type, name)
    }

    /// Finds a global element declaration.
    fn find_element(&self, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.find_component(ComponentKind::Element, name)
    }

    /// Finds a global attribute declaration.
    fn find_attribute(&self, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.find_component(ComponentKind::Attribute, name)
    }

    /// Finds a named model group.
    fn find_model_group(&self, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.find_component(ComponentKind::ModelGroup, name)
    }

    /// Finds a named attribute group.
    fn find_attribute_group(&self, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.find_component(ComponentKind::AttributeGroup, name)
    }

    /// Finds an identity constraint.
    fn find_identity_constraint(&self, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.find_component(ComponentKind::IdentityConstraint, name)
    }
}

/// A resolved, self-consistent schema type system.
///
/// Built once from a finished compilation and immutable thereafter; safe
/// to share across threads. Lookups delegate to the per-namespace sealed
/// containers, so the global view and the containers cannot drift apart.
pub struct TypeSystem {
    name: String,
    incomplete: bool,
    containers: HashMap<String, SealedContainer>,
    linker: Option<Arc<dyn SchemaTypeLoader>>,
}

impl TypeSystem {
    /// Assembles a type system from sealed containers.
    ///
    /// `incomplete` marks a partial system produced by a compile whose
    /// every error was recovered; incomplete systems cannot be saved to
    /// the binary store.
    pub fn new(
        name: impl Into<String>,
        containers: HashMap<String, SealedContainer>,
        incomplete: bool,
        linker: Option<Arc<dyn SchemaTypeLoader>>,
    ) -> Self {
        Self {
            name: name.into(),
            incomplete,
            containers,
            linker,
        }
    }

    /// The type system's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this is a partial (recovered-errors) system.
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    /// The namespaces this system defines, in no particular order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    /// Returns `true` if this system defines components in `namespace`.
    pub fn defines_namespace(&self, namespace: &str) -> bool {
        self.containers.contains_key(namespace)
    }

    /// The container for a namespace, if this system defines it.
    pub fn container(&self, namespace: &str) -> Option<&SealedContainer> {
        self.containers.get(namespace)
    }

    /// All containers.
    pub fn containers(&self) -> impl Iterator<Item = &SealedContainer> {
        self.containers.values()
    }

    /// Consumes the system, yielding its containers for carry-forward into
    /// an incremental rebuild.
    pub fn into_containers(self) -> HashMap<String, SealedContainer> {
        self.containers
    }

    /// Enumerates the global components of one kind in one namespace.
    pub fn globals_of(
        &self,
        namespace: &str,
        kind: ComponentKind,
    ) -> impl Iterator<Item = &Arc<SchemaComponent>> {
        self.containers
            .get(namespace)
            .into_iter()
            .flat_map(move |c| c.components_of(kind))
    }

    /// Enumerates every component in the system.
    pub fn all_components(&self) -> impl Iterator<Item = &Arc<SchemaComponent>> {
        self.containers.values().flat_map(|c| c.components().iter())
    }

    fn find_local(&self, kind: ComponentKind, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.containers
            .get(&name.namespace)
            .and_then(|c| c.find(kind, &name.local))
            .cloned()
    }
}

impl SchemaTypeLoader for TypeSystem {
    fn find_component(&self, kind: ComponentKind, name: &QName) -> Option<Arc<SchemaComponent>> {
        self.find_local(kind, name)
    }

    fn is_namespace_defined(&self, namespace: &str) -> bool {
        self.defines_namespace(namespace)
    }
}

/// Ref resolution view: own containers, then the builtin pool, then the
/// external linker chain.
impl ComponentLookup for TypeSystem {
    fn lookup(&self, kind: ComponentKind, name: &QName) -> Option<Arc<SchemaComponent>> {
        if let Some(c) = self.find_local(kind, name) {
            return Some(c);
        }
        if let Some(c) = builtin_pool().lookup(kind, name) {
            return Some(c);
        }
        self.linker
            .as_ref()
            .and_then(|l| l.find_component(kind, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::BUILTIN_NAMESPACE;
    use crate::component::ComponentPayload;
    use crate::container::ContainerBuilder;

    fn ty(ns: &str, local: &str) -> Arc<SchemaComponent> {
        Arc::new(SchemaComponent::new(
            QName::new(ns, local),
            ComponentPayload::Type {
                is_complex: false,
                base: None,
            },
            "file:///t.xsd",
        ))
    }

    fn system_with(ns: &str, locals: &[&str]) -> TypeSystem {
        let mut b = ContainerBuilder::new(ns);
        for l in locals {
            b.add(ty(ns, l));
        }
        let mut containers = HashMap::new();
        containers.insert(ns.to_string(), b.seal("sys"));
        TypeSystem::new("sys", containers, false, None)
    }

    #[test]
    fn find_type_in_own_namespace() {
        let sys = system_with("http://a", &["T"]);
        assert!(sys.find_type(&QName::new("http://a", "T")).is_some());
        assert!(sys.find_type(&QName::new("http://a", "U")).is_none());
        assert!(sys.find_type(&QName::new("http://b", "T")).is_none());
    }

    #[test]
    fn lookup_falls_through_to_builtins() {
        let sys = system_with("http://a", &["T"]);
        assert!(sys
            .lookup(ComponentKind::Type, &QName::new(BUILTIN_NAMESPACE, "string"))
            .is_some());
    }

    #[test]
    fn lookup_consults_linker_last() {
        let linked = Arc::new(system_with("http://lib", &["L"]));
        let mut b = ContainerBuilder::new("http://a");
        b.add(ty("http://a", "T"));
        let mut containers = HashMap::new();
        containers.insert("http://a".to_string(), b.seal("sys"));
        let sys = TypeSystem::new("sys", containers, false, Some(linked));

        assert!(sys
            .lookup(ComponentKind::Type, &QName::new("http://lib", "L"))
            .is_some());
        // But the loader surface only exposes locally defined components.
        assert!(sys.find_type(&QName::new("http://lib", "L")).is_none());
    }

    #[test]
    fn enumeration_per_namespace() {
        let sys = system_with("http://a", &["T", "U"]);
        let names: Vec<_> = sys
            .globals_of("http://a", ComponentKind::Type)
            .map(|c| c.name.local.clone())
            .collect();
        assert_eq!(names, vec!["T", "U"]);
        assert_eq!(sys.globals_of("http://b", ComponentKind::Type).count(), 0);
    }
}
