//! Namespace containers and their build/seal/rehome lifecycle.

use crate::component::{ComponentKind, SchemaComponent};
use std::collections::HashMap;
use std::sync::Arc;
use xsdc_common::QName;

/// The mutable namespace bucket used while a namespace is being translated.
///
/// Accepts components in definition order. Once translation of the
/// namespace completes, [`seal`](Self::seal) converts the builder into an
/// immutable [`SealedContainer`]; there is no way back.
pub struct ContainerBuilder {
    namespace: String,
    components: Vec<Arc<SchemaComponent>>,
}

impl ContainerBuilder {
    /// Creates an empty builder for the given namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            components: Vec::new(),
        }
    }

    /// The namespace this container collects.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Adds a component. The component must belong to this namespace.
    ///
    /// # Panics
    ///
    /// Panics if the component's namespace differs from the container's;
    /// the translator guarantees this never happens.
    pub fn add(&mut self, component: Arc<SchemaComponent>) {
        assert_eq!(
            component.namespace(),
            self.namespace,
            "component added to wrong container"
        );
        self.components.push(component);
    }

    /// Number of components collected so far.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if no components were collected.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterates the collected components in definition order.
    pub fn components(&self) -> impl Iterator<Item = &Arc<SchemaComponent>> {
        self.components.iter()
    }

    /// Seals the container, making it immutable and assigning it to the
    /// type system named `owner`.
    pub fn seal(self, owner: impl Into<String>) -> SealedContainer {
        let mut index = HashMap::with_capacity(self.components.len());
        for (i, c) in self.components.iter().enumerate() {
            // Later entries in a redefinition chain shadow earlier ones.
            index.insert((c.kind(), c.name.local.clone()), i);
        }
        SealedContainer {
            namespace: self.namespace,
            owner: owner.into(),
            components: self.components,
            index,
        }
    }
}

/// An immutable namespace container.
///
/// The component list and lookup index are frozen at seal time. The only
/// mutation ever applied afterwards is [`rehome`](Self::rehome), which
/// reassigns the container to a different owning type system; incremental
/// rebuilds use it to move unaffected namespaces into the new system
/// without touching the components.
pub struct SealedContainer {
    namespace: String,
    owner: String,
    components: Vec<Arc<SchemaComponent>>,
    index: HashMap<(ComponentKind, String), usize>,
}

impl SealedContainer {
    /// The namespace of this container.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The name of the type system that currently owns this container.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Reassigns this container to a different owning type system.
    pub fn rehome(&mut self, new_owner: impl Into<String>) {
        self.owner = new_owner.into();
    }

    /// Finds the component with the given kind and local name.
    ///
    /// For redefined components this returns the most-derived link of the
    /// chain (the last one stored).
    pub fn find(&self, kind: ComponentKind, local: &str) -> Option<&Arc<SchemaComponent>> {
        self.index
            .get(&(kind, local.to_string()))
            .map(|&i| &self.components[i])
    }

    /// Finds by qualified name, checking the namespace matches.
    pub fn find_qname(&self, kind: ComponentKind, name: &QName) -> Option<&Arc<SchemaComponent>> {
        if name.namespace != self.namespace {
            return None;
        }
        self.find(kind, &name.local)
    }

    /// All components, in definition order.
    pub fn components(&self) -> &[Arc<SchemaComponent>] {
        &self.components
    }

    /// Components of one kind, in definition order.
    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &Arc<SchemaComponent>> {
        self.components.iter().filter(move |c| c.kind() == kind)
    }
}
