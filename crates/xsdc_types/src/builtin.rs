//! The builtin XML Schema namespace.
//!
//! Every compile links implicitly against this pool: the any-type is the
//! fallback substituted when a declaration cannot be translated, and base
//! type references like `xs:string` resolve here.

use crate::component::{ComponentPayload, SchemaComponent};
use crate::rref::{ComponentLookup, Ref};
use crate::ComponentKind;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use xsdc_common::QName;

/// The XML Schema namespace URI.
pub const BUILTIN_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// The pool of builtin type components.
pub struct BuiltinPool {
    types: HashMap<String, Arc<SchemaComponent>>,
    any_type: Arc<SchemaComponent>,
}

impl BuiltinPool {
    fn build() -> Self {
        let mut types = HashMap::new();

        let any_type = Arc::new(SchemaComponent::new(
            QName::new(BUILTIN_NAMESPACE, "anyType"),
            ComponentPayload::Type {
                is_complex: true,
                base: None,
            },
            "",
        ));
        types.insert("anyType".to_string(), any_type.clone());

        fn add_simple(name: &str, base: &str, types: &mut HashMap<String, Arc<SchemaComponent>>) {
            let base_ref = Ref::resolved_to(types[base].clone());
            let c = Arc::new(SchemaComponent::new(
                QName::new(BUILTIN_NAMESPACE, name),
                ComponentPayload::Type {
                    is_complex: false,
                    base: Some(base_ref),
                },
                "",
            ));
            types.insert(name.to_string(), c);
        }

        add_simple("anySimpleType", "anyType", &mut types);
        for primitive in [
            "string",
            "boolean",
            "decimal",
            "float",
            "double",
            "dateTime",
            "date",
            "time",
            "duration",
            "hexBinary",
            "base64Binary",
            "anyURI",
            "QName",
        ] {
            add_simple(primitive, "anySimpleType", &mut types);
        }
        // The common derived numeric chain.
        add_simple("integer", "decimal", &mut types);
        add_simple("long", "integer", &mut types);
        add_simple("int", "long", &mut types);
        add_simple("short", "int", &mut types);
        add_simple("byte", "short", &mut types);
        add_simple("token", "string", &mut types);
        add_simple("NCName", "token", &mut types);

        Self { types, any_type }
    }

    /// The universal any-type, used as the recovery fallback.
    pub fn any_type(&self) -> &Arc<SchemaComponent> {
        &self.any_type
    }

    /// Finds a builtin type by local name.
    pub fn find(&self, local: &str) -> Option<&Arc<SchemaComponent>> {
        self.types.get(local)
    }

    /// Returns `true` if the given namespace is the builtin namespace.
    pub fn covers(&self, namespace: &str) -> bool {
        namespace == BUILTIN_NAMESPACE
    }
}

impl ComponentLookup for BuiltinPool {
    fn lookup(&self, kind: ComponentKind, name: &QName) -> Option<Arc<SchemaComponent>> {
        if kind != ComponentKind::Type || name.namespace != BUILTIN_NAMESPACE {
            return None;
        }
        self.types.get(&name.local).cloned()
    }
}

/// The process-wide builtin pool.
pub fn builtin_pool() -> &'static BuiltinPool {
    static POOL: OnceLock<BuiltinPool> = OnceLock::new();
    POOL.get_or_init(BuiltinPool::build)
}

/// The universal any-type, cloned out of the builtin pool.
pub fn any_type() -> Arc<SchemaComponent> {
    builtin_pool().any_type().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_type_is_complex_and_baseless() {
        let t = any_type();
        match &t.payload {
            ComponentPayload::Type { is_complex, base } => {
                assert!(is_complex);
                assert!(base.is_none());
            }
            _ => panic!("anyType must be a type"),
        }
    }

    #[test]
    fn string_derives_from_any_simple_type() {
        let pool = builtin_pool();
        let s = pool.find("string").unwrap();
        match &s.payload {
            ComponentPayload::Type { base: Some(b), .. } => {
                assert_eq!(b.key().name.local, "anySimpleType");
            }
            _ => panic!("string must have a base"),
        }
    }

    #[test]
    fn lookup_only_matches_types_in_builtin_namespace() {
        let pool = builtin_pool();
        assert!(pool
            .lookup(ComponentKind::Type, &QName::new(BUILTIN_NAMESPACE, "int"))
            .is_some());
        assert!(pool
            .lookup(ComponentKind::Element, &QName::new(BUILTIN_NAMESPACE, "int"))
            .is_none());
        assert!(pool
            .lookup(ComponentKind::Type, &QName::new("http://a", "int"))
            .is_none());
    }

    #[test]
    fn numeric_chain_reaches_decimal() {
        let pool = builtin_pool();
        let mut current = pool.find("int").unwrap().clone();
        let mut seen = Vec::new();
        loop {
            seen.push(current.name.local.clone());
            match &current.payload {
                ComponentPayload::Type { base: Some(b), .. } => {
                    current = b.get().expect("builtin bases are pre-resolved").clone();
                }
                _ => break,
            }
        }
        assert!(seen.contains(&"decimal".to_string()));
        assert_eq!(seen.last().map(String::as_str), Some("anyType"));
    }
}
