//! Save/load integration tests over a real directory.

use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use xsdc_common::QName;
use xsdc_config::StoreConfig;
use xsdc_store::{handle, StoreError, TypeSystemStore};
use xsdc_types::{
    ComponentKind, ComponentPayload, ContainerBuilder, Ref, SchemaComponent, SchemaTypeLoader,
    TypeSystem,
};

fn ty(ns: &str, local: &str) -> Arc<SchemaComponent> {
    Arc::new(SchemaComponent::new(
        QName::new(ns, local),
        ComponentPayload::Type {
            is_complex: true,
            base: None,
        },
        "file:///schema.xsd",
    ))
}

fn elt(ns: &str, local: &str, ty_ref: Ref) -> Arc<SchemaComponent> {
    Arc::new(SchemaComponent::new(
        QName::new(ns, local),
        ComponentPayload::Element { ty: ty_ref },
        "file:///schema.xsd",
    ))
}

fn seal_system(name: &str, builders: Vec<ContainerBuilder>) -> TypeSystem {
    let mut containers = HashMap::new();
    for b in builders {
        let ns = b.namespace().to_string();
        containers.insert(ns, b.seal(name));
    }
    TypeSystem::new(name, containers, false, None)
}

fn store_in(dir: &TempDir) -> TypeSystemStore {
    TypeSystemStore::new(dir.path(), &StoreConfig::default())
}

#[test]
fn element_type_resolves_through_loaded_index() {
    let dir = TempDir::new().unwrap();
    let mut b = ContainerBuilder::new("http://a");
    b.add(ty("http://a", "T"));
    b.add(elt(
        "http://a",
        "E",
        Ref::new(ComponentKind::Type, QName::new("http://a", "T")),
    ));
    let sys = seal_system("sys", vec![b]);

    let store = store_in(&dir);
    store.save(&sys).unwrap();
    let lazy = store.load("sys", None).unwrap();

    assert_eq!(lazy.name(), "sys");
    assert!(lazy.is_namespace_defined("http://a"));
    assert_eq!(lazy.handle_count(), 2);

    let t = lazy.find_type(&QName::new("http://a", "T")).unwrap();
    let e = lazy.find_element(&QName::new("http://a", "E")).unwrap();
    let ComponentPayload::Element { ty: ty_ref } = &e.payload else {
        panic!("element unit decoded to a non-element payload");
    };
    // Both the name-map lookup and the element's own reference must land
    // on the single memoized unit.
    let through_ref = ty_ref.resolve(&lazy).unwrap();
    assert!(Arc::ptr_eq(&t, &through_ref));
}

#[test]
fn redefinition_chain_survives_the_roundtrip() {
    let dir = TempDir::new().unwrap();
    let base = ty("http://a", "T");
    let derived = Arc::new(SchemaComponent {
        name: QName::new("http://a", "T"),
        payload: ComponentPayload::Type {
            is_complex: true,
            base: Some(Ref::resolved_to(base.clone())),
        },
        source_url: "file:///redefining.xsd".to_string(),
        redefined_from: Some(Ref::resolved_to(base.clone())),
    });
    let mut b = ContainerBuilder::new("http://a");
    b.add(base);
    b.add(derived);
    let sys = seal_system("sys", vec![b]);

    let store = store_in(&dir);
    store.save(&sys).unwrap();
    let lazy = store.load("sys", None).unwrap();

    // The visible lookup yields the most-derived link.
    let found = lazy.find_type(&QName::new("http://a", "T")).unwrap();
    assert_eq!(found.source_url, "file:///redefining.xsd");

    // Its prior link is rebuilt from the persisted handle pair, not
    // re-resolved by name (which would cycle back to the derived link).
    let prior = found
        .redefined_from
        .as_ref()
        .and_then(|r| r.get())
        .expect("prior link should be pre-resolved after load");
    assert_eq!(prior.name, QName::new("http://a", "T"));
    assert_eq!(prior.source_url, "file:///schema.xsd");
    assert!(prior.redefined_from.is_none());

    // The self-named base is rebound to the prior link too.
    let ComponentPayload::Type {
        base: Some(base), ..
    } = &found.payload
    else {
        panic!("derived link must keep its base");
    };
    let bound = base.get().expect("self-named base should be pre-resolved");
    assert!(Arc::ptr_eq(bound, prior));
}

#[test]
fn document_type_map_points_at_hoisted_anonymous_type() {
    let dir = TempDir::new().unwrap();
    let mut b = ContainerBuilder::new("http://a");
    b.add(ty("http://a", "E$anon"));
    b.add(elt(
        "http://a",
        "E",
        Ref::new(ComponentKind::Type, QName::new("http://a", "E$anon")),
    ));
    let sys = seal_system("sys", vec![b]);

    let store = store_in(&dir);
    store.save(&sys).unwrap();
    let lazy = store.load("sys", None).unwrap();

    let doc_type = lazy.document_type(&QName::new("http://a", "E")).unwrap();
    assert_eq!(doc_type.name.local, "E$anon");
    // Elements without a hoisted type stay out of the map.
    assert!(lazy.document_type(&QName::new("http://a", "F")).is_none());
}

#[test]
fn concurrent_resolutions_converge_on_one_component() {
    let dir = TempDir::new().unwrap();
    let mut b = ContainerBuilder::new("http://a");
    b.add(ty("http://a", "T"));
    let sys = seal_system("sys", vec![b]);

    let store = store_in(&dir);
    store.save(&sys).unwrap();
    let lazy = store.load("sys", None).unwrap();

    let resolved: Vec<Arc<SchemaComponent>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| lazy.resolve_handle("T_type").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for c in &resolved[1..] {
        assert!(Arc::ptr_eq(&resolved[0], c));
    }
}

#[test]
fn pointer_files_name_the_owning_system() {
    let dir = TempDir::new().unwrap();
    let mut b = ContainerBuilder::new("http://a");
    b.add(ty("http://a", "T"));
    let sys = seal_system("sys", vec![b]);

    let store = store_in(&dir);
    store.save(&sys).unwrap();

    assert_eq!(store.owner_of_namespace("http://a").as_deref(), Some("sys"));
    assert_eq!(
        store
            .owner_of_component(ComponentKind::Type, &QName::new("http://a", "T"))
            .as_deref(),
        Some("sys")
    );
    assert_eq!(
        store.owner_of_classname("schema.T").as_deref(),
        Some("sys")
    );
    assert!(store.owner_of_namespace("http://other").is_none());
}

#[test]
fn prefixed_handles_route_past_the_local_pool() {
    let dir = TempDir::new().unwrap();
    let mut b = ContainerBuilder::new("http://a");
    b.add(ty("http://a", "T"));
    let sys = seal_system("sys", vec![b]);

    let mut lib_builder = ContainerBuilder::new("http://lib");
    lib_builder.add(ty("http://lib", "L"));
    let lib: Arc<dyn SchemaTypeLoader> = Arc::new(seal_system("lib", vec![lib_builder]));

    let store = store_in(&dir);
    store.save(&sys).unwrap();
    let lazy = store.load("sys", Some(lib)).unwrap();

    let builtin = lazy
        .resolve_handle(&handle::encode_builtin("string"))
        .unwrap();
    assert_eq!(builtin.name.local, "string");

    let external = lazy
        .resolve_handle(&handle::encode_external(
            ComponentKind::Type,
            &QName::new("http://lib", "L"),
        ))
        .unwrap();
    assert_eq!(external.name, QName::new("http://lib", "L"));

    let err = lazy.resolve_handle("missing_type").unwrap_err();
    assert!(matches!(err, StoreError::UnknownHandle { .. }));
}

#[test]
fn load_of_unknown_system_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let err = store.load("nope", None).unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }));
}
