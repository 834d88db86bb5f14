//! The resolved schema component model.
//!
//! Components never hold direct pointers to one another: every
//! cross-reference is a [`Ref`], a memoized lookup key resolved through a
//! [`ComponentLookup`]. This keeps the component graph cycle-safe and lets
//! references cross type-system boundaries (external linkers, the builtin
//! pool, lazily-loaded stores) transparently.
//!
//! Namespace buckets follow a two-state machine: a [`ContainerBuilder`]
//! accepts components while its namespace is being translated, then seals
//! into an immutable [`SealedContainer`]. Sealed containers can be
//! reassigned to a different owning type system (`rehome`), which is how
//! incremental rebuilds carry unaffected namespaces forward without
//! copying or mutating components.

#![warn(missing_docs)]

pub mod builtin;
pub mod component;
pub mod container;
pub mod rref;
pub mod typesystem;

pub use builtin::{any_type, builtin_pool, BuiltinPool, BUILTIN_NAMESPACE};
pub use component::{
    ComponentKind, ComponentPayload, ConstraintCategory, LocalAttribute, Particle,
    SchemaComponent,
};
pub use container::{ContainerBuilder, SealedContainer};
pub use rref::{ComponentLookup, Ref, RefKey};
pub use typesystem::{SchemaTypeLoader, TypeSystem};
