//! The parsed schema document model and its external boundaries.
//!
//! XML parsing is out of scope for the compiler: documents arrive through
//! the [`DocumentParser`] trait already broken into target namespace,
//! composition clauses (`import`/`include`/`redefine`) and top-level
//! declarations. Entity resolution (catalog redirects, in-memory streams)
//! is likewise a trait boundary. The compiler's own state is the
//! [`DocumentSet`], a dense arena of downloaded documents keyed by
//! [`DocId`].

#![warn(missing_docs)]

pub mod doc_set;
pub mod model;
pub mod properties;
pub mod traits;

pub use doc_set::{DocId, DocumentSet};
pub use model::{
    AttributeDecl, AttributeGroupDecl, ElementDecl, IdentityCategory, IdentityConstraintDecl,
    ImportClause, IncludeClause, ModelGroupDecl, ParticleDecl, RawQName, RedefineClause,
    SchemaDocument, TypeDecl,
};
pub use properties::DocumentProperties;
pub use traits::{DocumentError, DocumentParser, EntityResolver, ResolvedEntity};
