//! Schema components: the named artifacts of a resolved type system.

use crate::rref::Ref;
use serde::{Deserialize, Serialize};
use xsdc_common::QName;

/// The six kinds of global schema component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ComponentKind {
    /// A global simple or complex type definition.
    Type,
    /// A global element declaration.
    Element,
    /// A global attribute declaration.
    Attribute,
    /// A named model group.
    ModelGroup,
    /// A named attribute group.
    AttributeGroup,
    /// An identity constraint (key, keyref, or unique).
    IdentityConstraint,
}

impl ComponentKind {
    /// All kinds, in their stable binary-code order.
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Type,
        ComponentKind::Element,
        ComponentKind::Attribute,
        ComponentKind::ModelGroup,
        ComponentKind::AttributeGroup,
        ComponentKind::IdentityConstraint,
    ];

    /// The stable one-byte code used in the binary format.
    pub fn code(self) -> u8 {
        match self {
            ComponentKind::Type => 1,
            ComponentKind::Element => 2,
            ComponentKind::Attribute => 3,
            ComponentKind::ModelGroup => 4,
            ComponentKind::AttributeGroup => 5,
            ComponentKind::IdentityConstraint => 6,
        }
    }

    /// Decodes a binary kind code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// A short human-readable label, also used as the handle suffix.
    pub fn label(self) -> &'static str {
        match self {
            ComponentKind::Type => "type",
            ComponentKind::Element => "element",
            ComponentKind::Attribute => "attribute",
            ComponentKind::ModelGroup => "model group",
            ComponentKind::AttributeGroup => "attribute group",
            ComponentKind::IdentityConstraint => "identity constraint",
        }
    }
}

/// The category of an identity constraint component.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// A `key` constraint.
    Key,
    /// A `keyref` constraint.
    KeyRef,
    /// A `unique` constraint.
    Unique,
}

/// A local element particle inside a model group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Particle {
    /// The local element name.
    pub name: String,
    /// The particle's type.
    pub ty: Ref,
}

/// A local attribute inside an attribute group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalAttribute {
    /// The local attribute name.
    pub name: String,
    /// The attribute's type.
    pub ty: Ref,
}

/// Kind-specific structural data of a component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ComponentPayload {
    /// A type definition.
    Type {
        /// `true` for complex types.
        is_complex: bool,
        /// The base type this type derives from, if any.
        base: Option<Ref>,
    },
    /// A global element declaration.
    Element {
        /// The element's type.
        ty: Ref,
    },
    /// A global attribute declaration.
    Attribute {
        /// The attribute's type.
        ty: Ref,
    },
    /// A named model group.
    ModelGroup {
        /// The element particles of the group.
        particles: Vec<Particle>,
        /// References to other named groups.
        group_refs: Vec<Ref>,
    },
    /// A named attribute group.
    AttributeGroup {
        /// The local attributes of the group.
        attributes: Vec<LocalAttribute>,
        /// References to other named attribute groups.
        group_refs: Vec<Ref>,
    },
    /// An identity constraint.
    IdentityConstraint {
        /// The constraint category.
        category: ConstraintCategory,
        /// The selector XPath, uninterpreted.
        selector: String,
        /// The field XPaths, uninterpreted.
        fields: Vec<String>,
        /// For `keyref`, the referred key.
        refer: Option<Ref>,
    },
}

impl ComponentPayload {
    /// Returns the component kind this payload belongs to.
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentPayload::Type { .. } => ComponentKind::Type,
            ComponentPayload::Element { .. } => ComponentKind::Element,
            ComponentPayload::Attribute { .. } => ComponentKind::Attribute,
            ComponentPayload::ModelGroup { .. } => ComponentKind::ModelGroup,
            ComponentPayload::AttributeGroup { .. } => ComponentKind::AttributeGroup,
            ComponentPayload::IdentityConstraint { .. } => ComponentKind::IdentityConstraint,
        }
    }
}

/// A resolved global schema component.
///
/// Components are immutable once built and shared as
/// `Arc<SchemaComponent>`. Each belongs to exactly one namespace (possibly
/// the empty string) and lives in exactly one container. All links to
/// other components go through [`Ref`]s.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaComponent {
    /// The component's qualified name.
    pub name: QName,
    /// Kind-specific structural data.
    pub payload: ComponentPayload,
    /// Source URL of the document that defined this component.
    pub source_url: String,
    /// The prior link in this component's redefinition chain, if it is a
    /// redefinition.
    pub redefined_from: Option<Ref>,
}

impl SchemaComponent {
    /// Creates a component with no redefinition link.
    pub fn new(name: QName, payload: ComponentPayload, source_url: impl Into<String>) -> Self {
        Self {
            name,
            payload,
            source_url: source_url.into(),
            redefined_from: None,
        }
    }

    /// Returns the component's kind.
    pub fn kind(&self) -> ComponentKind {
        self.payload.kind()
    }

    /// Returns the namespace this component belongs to.
    pub fn namespace(&self) -> &str {
        &self.name.namespace
    }
}
