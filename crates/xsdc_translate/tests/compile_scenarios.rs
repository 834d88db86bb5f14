//! End-to-end compile scenarios over in-memory document fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use xsdc_common::ContentHash;
use xsdc_config::CompilerConfig;
use xsdc_diagnostics::DiagnosticSink;
use xsdc_document::{
    DocumentError, DocumentParser, DocumentProperties, ElementDecl, EntityResolver, ImportClause,
    IncludeClause, RawQName, RedefineClause, ResolvedEntity, SchemaDocument, TypeDecl,
};
use xsdc_state::errors::E201;
use xsdc_translate::{compile, CompileError, PriorBuild};
use xsdc_types::{ComponentKind, ComponentPayload};

/// Parser fixture: documents are prebuilt and keyed by URL; the byte
/// payload (the URL itself, so digests stay distinct) is ignored.
struct FixtureParser(HashMap<String, SchemaDocument>);

impl DocumentParser for FixtureParser {
    fn parse(&self, _bytes: &[u8], url: &str) -> Result<SchemaDocument, DocumentError> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| DocumentError::new(url, "unknown fixture"))
    }
}

/// Entity resolver serving each known URL as its own bytes.
struct UrlResolver(HashSet<String>);

impl EntityResolver for UrlResolver {
    fn resolve_entity(&self, _ns: Option<&str>, location: &str) -> Option<ResolvedEntity> {
        self.0
            .contains(location)
            .then(|| ResolvedEntity::Bytes(location.as_bytes().to_vec()))
    }
}

fn doc(url: &str, ns: Option<&str>) -> SchemaDocument {
    SchemaDocument::empty(
        ns.map(str::to_string),
        DocumentProperties::new(url, ContentHash::from_bytes(url.as_bytes())),
    )
}

fn type_decl(name: &str, base: Option<RawQName>) -> TypeDecl {
    TypeDecl {
        name: Some(name.to_string()),
        is_complex: true,
        base,
        line: None,
    }
}

fn element_decl(name: &str, ty: RawQName) -> ElementDecl {
    ElementDecl {
        name: Some(name.to_string()),
        ty: Some(ty),
        nested_type: None,
        line: None,
    }
}

fn fixtures(docs: Vec<SchemaDocument>) -> (FixtureParser, UrlResolver) {
    let mut map = HashMap::new();
    let mut urls = HashSet::new();
    for d in docs {
        let url = d.properties.source_url.clone();
        urls.insert(url.clone());
        map.insert(url, d);
    }
    (FixtureParser(map), UrlResolver(urls))
}

#[test]
fn import_scenario_links_element_to_type_and_tracks_dependency() {
    let mut a = doc("file:///a.xsd", Some("http://a"));
    a.types.push(type_decl("T", None));

    let mut b = doc("file:///b.xsd", Some("http://b"));
    b.imports.push(ImportClause {
        namespace: Some("http://a".to_string()),
        location: Some("file:///a.xsd".to_string()),
        line: None,
    });
    b.elements
        .push(element_decl("E", RawQName::qualified("http://a", "T")));

    let (parser, resolver) = fixtures(vec![]);
    let sink = DiagnosticSink::new();
    let out = compile(
        None,
        "scenario",
        vec![a, b],
        None,
        &CompilerConfig::default(),
        &parser,
        Some(&resolver),
        &sink,
    )
    .unwrap();

    assert!(!sink.has_errors());
    let system = out.system.expect("complete system");

    let e = system
        .container("http://b")
        .unwrap()
        .find(ComponentKind::Element, "E")
        .unwrap();
    let t = system
        .container("http://a")
        .unwrap()
        .find(ComponentKind::Type, "T")
        .unwrap();
    let ComponentPayload::Element { ty } = &e.payload else {
        panic!("E is not an element");
    };
    assert!(Arc::ptr_eq(ty.get().unwrap(), t));

    // the structural dependency b -> a is in the tracker
    let affected = out.tracker.transitive_closure(["http://a"]);
    assert!(affected.contains("http://b"));
}

#[test]
fn incremental_rebuild_carries_unaffected_namespaces_forward() {
    let mut a = doc("file:///a.xsd", Some("http://a"));
    a.types.push(type_decl("T", None));
    let mut b = doc("file:///b.xsd", Some("http://b"));
    b.imports.push(ImportClause {
        namespace: Some("http://a".to_string()),
        location: Some("file:///a.xsd".to_string()),
        line: None,
    });
    b.elements
        .push(element_decl("E", RawQName::qualified("http://a", "T")));
    let mut c = doc("file:///c.xsd", Some("http://c"));
    c.types.push(type_decl("C", None));

    let (parser, resolver) = fixtures(vec![]);
    let sink = DiagnosticSink::new();
    let config = CompilerConfig::default();
    let out = compile(
        None,
        "scenario",
        vec![a, b.clone(), c],
        None,
        &config,
        &parser,
        Some(&resolver),
        &sink,
    )
    .unwrap();
    let system = out.system.unwrap();

    // editing a.xsd implicates http://b but not http://c
    let stale = out.tracker.transitive_closure(["http://a"]);
    assert!(stale.contains("http://b"));
    assert!(!stale.contains("http://c"));

    // recompile only the stale namespaces' documents
    let mut a2 = doc("file:///a.xsd", Some("http://a"));
    a2.types.push(type_decl("T", None));
    a2.types.push(type_decl("T2", None));

    let sink2 = DiagnosticSink::new();
    let out2 = compile(
        Some(PriorBuild {
            system,
            tracker: out.tracker,
        }),
        "scenario",
        vec![a2, b],
        None,
        &config,
        &parser,
        Some(&resolver),
        &sink2,
    )
    .unwrap();
    assert!(!sink2.has_errors());
    let system2 = out2.system.unwrap();

    // http://c was carried forward untouched
    assert!(system2.defines_namespace("http://c"));
    assert!(system2
        .container("http://c")
        .unwrap()
        .find(ComponentKind::Type, "C")
        .is_some());

    // the rebuilt namespaces see the new definitions
    assert!(system2
        .container("http://a")
        .unwrap()
        .find(ComponentKind::Type, "T2")
        .is_some());
    let e = system2
        .container("http://b")
        .unwrap()
        .find(ComponentKind::Element, "E")
        .unwrap();
    let t = system2
        .container("http://a")
        .unwrap()
        .find(ComponentKind::Type, "T")
        .unwrap();
    let ComponentPayload::Element { ty } = &e.payload else {
        panic!("E is not an element");
    };
    assert!(Arc::ptr_eq(ty.get().unwrap(), t));
}

#[test]
fn redefinition_chain_applies_base_to_derived() {
    // a redefines b, b redefines c; c holds the original X
    let mut a = doc("file:///a.xsd", Some("http://r"));
    a.redefines.push(RedefineClause {
        location: "file:///b.xsd".to_string(),
        types: vec![type_decl("X", Some(RawQName::unqualified("X")))],
        model_groups: vec![],
        attribute_groups: vec![],
        line: None,
    });
    let mut b = doc("file:///b.xsd", Some("http://r"));
    b.redefines.push(RedefineClause {
        location: "file:///c.xsd".to_string(),
        types: vec![type_decl("X", Some(RawQName::unqualified("X")))],
        model_groups: vec![],
        attribute_groups: vec![],
        line: None,
    });
    let mut c = doc("file:///c.xsd", Some("http://r"));
    c.types.push(type_decl("X", None));

    let (parser, resolver) = fixtures(vec![b, c]);
    let sink = DiagnosticSink::new();
    let out = compile(
        None,
        "redef",
        vec![a],
        None,
        &CompilerConfig::default(),
        &parser,
        Some(&resolver),
        &sink,
    )
    .unwrap();
    assert!(!sink.has_errors());
    let system = out.system.unwrap();

    // the visible X is the most derived (a's), chained back to c's
    let x = system
        .container("http://r")
        .unwrap()
        .find(ComponentKind::Type, "X")
        .unwrap();
    assert_eq!(x.source_url, "file:///a.xsd");

    let b_link = x.redefined_from.as_ref().unwrap().get().unwrap();
    assert_eq!(b_link.source_url, "file:///b.xsd");

    let c_link = b_link.redefined_from.as_ref().unwrap().get().unwrap();
    assert_eq!(c_link.source_url, "file:///c.xsd");
    assert!(c_link.redefined_from.is_none());

    // each link's base type is its prior link
    let ComponentPayload::Type { base, .. } = &x.payload else {
        panic!("X is not a type");
    };
    assert!(Arc::ptr_eq(base.as_ref().unwrap().get().unwrap(), b_link));
}

#[test]
fn chameleon_include_qualifies_definitions_under_includer() {
    let mut root = doc("file:///a.xsd", Some("http://a"));
    root.includes.push(IncludeClause {
        location: "file:///common.xsd".to_string(),
        line: None,
    });
    root.elements
        .push(element_decl("E", RawQName::unqualified("Shared")));

    let mut common = doc("file:///common.xsd", None);
    common.types.push(type_decl("Shared", None));

    let (parser, resolver) = fixtures(vec![common]);
    let sink = DiagnosticSink::new();
    let out = compile(
        None,
        "chameleon",
        vec![root],
        None,
        &CompilerConfig::default(),
        &parser,
        Some(&resolver),
        &sink,
    )
    .unwrap();
    assert!(!sink.has_errors());
    let system = out.system.unwrap();

    // the chameleon type was adopted into http://a
    let shared = system
        .container("http://a")
        .unwrap()
        .find(ComponentKind::Type, "Shared")
        .unwrap();
    assert_eq!(shared.name.namespace, "http://a");

    let e = system
        .container("http://a")
        .unwrap()
        .find(ComponentKind::Element, "E")
        .unwrap();
    let ComponentPayload::Element { ty } = &e.payload else {
        panic!("E is not an element");
    };
    assert!(Arc::ptr_eq(ty.get().unwrap(), shared));
}

#[test]
fn duplicate_definition_fails_the_compile() {
    let mut a = doc("file:///a.xsd", Some("http://a"));
    a.types.push(type_decl("T", None));
    let mut b = doc("file:///b.xsd", Some("http://a"));
    b.types.push(type_decl("T", None));

    let (parser, resolver) = fixtures(vec![]);
    let sink = DiagnosticSink::new();
    let result = compile(
        None,
        "dup",
        vec![a, b],
        None,
        &CompilerConfig::default(),
        &parser,
        Some(&resolver),
        &sink,
    );
    match result {
        Err(CompileError::Failed { first }) => assert_eq!(first.code, E201),
        other => panic!("expected a failed compile, got {:?}", other.is_ok()),
    }
}

#[test]
fn unresolved_reference_respects_partial_types_option() {
    let mut a = doc("file:///a.xsd", Some("http://a"));
    a.elements
        .push(element_decl("E", RawQName::qualified("http://a", "Missing")));

    let (parser, resolver) = fixtures(vec![]);

    // partial types off: recovered errors, no system
    let sink = DiagnosticSink::new();
    let out = compile(
        None,
        "partial",
        vec![a.clone()],
        None,
        &CompilerConfig::default(),
        &parser,
        Some(&resolver),
        &sink,
    )
    .unwrap();
    assert!(sink.has_errors());
    assert!(sink.all_recovered());
    assert!(out.system.is_none());

    // partial types on: an explicitly incomplete system
    let mut config = CompilerConfig::default();
    config.schema.partial_types = true;
    let sink = DiagnosticSink::new();
    let out = compile(
        None,
        "partial",
        vec![a],
        None,
        &config,
        &parser,
        Some(&resolver),
        &sink,
    )
    .unwrap();
    let system = out.system.unwrap();
    assert!(system.is_incomplete());
}
