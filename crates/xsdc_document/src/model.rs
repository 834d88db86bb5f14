//! Structural model of a parsed schema document.
//!
//! Only the structure the compiler needs is modeled: composition clauses
//! and the six kinds of top-level declaration, with namespace prefixes
//! already resolved to URIs by the parser. Content-model details beyond
//! cross-references (facets, occurrence constraints, wildcards) belong to
//! the external checker stage and are not represented here.

use crate::properties::DocumentProperties;
use serde::{Deserialize, Serialize};

/// A qualified name as written in a source document.
///
/// `namespace: None` means the reference was unqualified; its namespace is
/// decided at translation time (target namespace or chameleon adoption).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawQName {
    /// The namespace URI the prefix resolved to, if the name was qualified.
    pub namespace: Option<String>,
    /// The local part of the name.
    pub local: String,
}

impl RawQName {
    /// A qualified reference.
    pub fn qualified(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// An unqualified reference.
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }
}

/// An `import` clause: a reference to a document in another namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportClause {
    /// The namespace the import declares. `None` imports the no-namespace
    /// schema.
    pub namespace: Option<String>,
    /// The schema location hint, possibly relative.
    pub location: Option<String>,
    /// Source line of the clause, when line annotations were requested.
    pub line: Option<u32>,
}

/// An `include` clause: a reference to a document in the same namespace
/// (or a namespace-less chameleon document).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludeClause {
    /// The schema location, possibly relative.
    pub location: String,
    /// Source line of the clause.
    pub line: Option<u32>,
}

/// A `redefine` clause: an include that additionally reinterprets some of
/// the included document's components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedefineClause {
    /// The schema location, possibly relative.
    pub location: String,
    /// Redefining type declarations.
    pub types: Vec<TypeDecl>,
    /// Redefining model group declarations.
    pub model_groups: Vec<ModelGroupDecl>,
    /// Redefining attribute group declarations.
    pub attribute_groups: Vec<AttributeGroupDecl>,
    /// Source line of the clause.
    pub line: Option<u32>,
}

/// A top-level (or redefining) type declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    /// The declared name. `None` on malformed declarations.
    pub name: Option<String>,
    /// `true` for complex types, `false` for simple types.
    pub is_complex: bool,
    /// The base type reference, if the type derives from one.
    pub base: Option<RawQName>,
    /// Source line of the declaration.
    pub line: Option<u32>,
}

/// A top-level element declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDecl {
    /// The declared name. `None` on malformed declarations.
    pub name: Option<String>,
    /// The element's type reference, if given as an attribute.
    pub ty: Option<RawQName>,
    /// An anonymous nested type definition, if the type was given inline.
    pub nested_type: Option<TypeDecl>,
    /// Source line of the declaration.
    pub line: Option<u32>,
}

/// A top-level attribute declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// The declared name. `None` on malformed declarations.
    pub name: Option<String>,
    /// The attribute's type reference, if given as an attribute.
    pub ty: Option<RawQName>,
    /// An anonymous nested simple type, if the type was given inline.
    pub nested_type: Option<TypeDecl>,
    /// Source line of the declaration.
    pub line: Option<u32>,
}

/// A particle inside a named model group: a local element with a type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleDecl {
    /// The local element name.
    pub name: String,
    /// The element's type reference.
    pub ty: Option<RawQName>,
}

/// A top-level (or redefining) named model group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelGroupDecl {
    /// The declared name. `None` on malformed declarations.
    pub name: Option<String>,
    /// The element particles of the group.
    pub particles: Vec<ParticleDecl>,
    /// References to other named groups.
    pub group_refs: Vec<RawQName>,
    /// Source line of the declaration.
    pub line: Option<u32>,
}

/// A top-level (or redefining) named attribute group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeGroupDecl {
    /// The declared name. `None` on malformed declarations.
    pub name: Option<String>,
    /// The local attribute declarations of the group.
    pub attributes: Vec<AttributeDecl>,
    /// References to other named attribute groups.
    pub group_refs: Vec<RawQName>,
    /// Source line of the declaration.
    pub line: Option<u32>,
}

/// The category of an identity constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityCategory {
    /// A `key` constraint.
    Key,
    /// A `keyref` constraint referring to a key.
    KeyRef,
    /// A `unique` constraint.
    Unique,
}

/// An identity constraint, hoisted to the top level by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConstraintDecl {
    /// The declared name. `None` on malformed declarations.
    pub name: Option<String>,
    /// The constraint category.
    pub category: IdentityCategory,
    /// The selector XPath, uninterpreted here.
    pub selector: String,
    /// The field XPaths, uninterpreted here.
    pub fields: Vec<String>,
    /// For `keyref`, the referred key's name.
    pub refer: Option<RawQName>,
    /// Source line of the declaration.
    pub line: Option<u32>,
}

/// A parsed schema document: target namespace, composition clauses, and
/// top-level declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// The declared target namespace. `None` makes this a candidate
    /// chameleon document.
    pub target_namespace: Option<String>,
    /// `import` clauses.
    pub imports: Vec<ImportClause>,
    /// `include` clauses.
    pub includes: Vec<IncludeClause>,
    /// `redefine` clauses.
    pub redefines: Vec<RedefineClause>,
    /// Top-level type declarations.
    pub types: Vec<TypeDecl>,
    /// Top-level element declarations.
    pub elements: Vec<ElementDecl>,
    /// Top-level attribute declarations.
    pub attributes: Vec<AttributeDecl>,
    /// Top-level named model groups.
    pub model_groups: Vec<ModelGroupDecl>,
    /// Top-level named attribute groups.
    pub attribute_groups: Vec<AttributeGroupDecl>,
    /// Identity constraints, hoisted from their element declarations.
    pub identity_constraints: Vec<IdentityConstraintDecl>,
    /// Download metadata (source URL, content digest).
    pub properties: DocumentProperties,
}

impl SchemaDocument {
    /// Creates an empty document with the given namespace and properties.
    pub fn empty(target_namespace: Option<String>, properties: DocumentProperties) -> Self {
        Self {
            target_namespace,
            imports: Vec::new(),
            includes: Vec::new(),
            redefines: Vec::new(),
            types: Vec::new(),
            elements: Vec::new(),
            attributes: Vec::new(),
            model_groups: Vec::new(),
            attribute_groups: Vec::new(),
            identity_constraints: Vec::new(),
            properties,
        }
    }

    /// Returns the target namespace, with `None` normalized to `""`.
    pub fn namespace_or_empty(&self) -> &str {
        self.target_namespace.as_deref().unwrap_or("")
    }

    /// Returns `true` if the document declares no target namespace.
    pub fn is_chameleon_candidate(&self) -> bool {
        self.target_namespace.is_none()
    }
}
