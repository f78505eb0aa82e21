//! Arbor Schema: the statically described object graph
//!
//! A schema is a list of [`EntityType`]s, each declaring the relationship
//! fields that connect it to other types. Hierarchy markers on types
//! ([`TypeMarker`]) and fields ([`FieldMarker`]) describe how the graph is
//! presented as a virtual tree:
//!
//! ```text
//!   Brand  (root, "Vehicle Hierarchy")
//!     └── models: MultiChild -> VehicleModel   (child edge, "Models")
//!           └── parts: MultiPeer -> Part       (child edge, "Compatible Parts")
//! ```
//!
//! The registry is built once from a [`SchemaDocument`] (or directly from a
//! `Vec<EntityType>`), validated, and never mutated afterwards. Runtime
//! reflection is replaced by these explicit descriptors.
//!
//! The [`repository`] module holds the seam to the record storage engine:
//! the core only ever talks to records through the [`Repository`] trait.

pub mod key;
pub mod registry;
pub mod repository;
pub mod types;

use thiserror::Error;

pub use key::{KeyKind, KeyValue};
pub use registry::{SchemaDocument, SchemaRegistry};
pub use repository::{EntityRecord, Repository, RepositoryError};
pub use types::{EntityType, FieldMarker, RelationKind, RelationshipField, TypeMarker};

pub type Name = String;

/// Errors raised while building a registry or parsing primary keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate entity type `{0}`")]
    DuplicateType(Name),

    #[error("entity type `{entity}` declares field `{field}` twice")]
    DuplicateField { entity: Name, field: Name },

    #[error("field `{entity}.{field}` targets unknown type `{target}`")]
    UnknownTarget {
        entity: Name,
        field: Name,
        target: Name,
    },

    #[error("field `{entity}.{field}` is mapped by `{mapped_by}`, which `{target}` does not declare")]
    UnknownMappedBy {
        entity: Name,
        field: Name,
        target: Name,
        mapped_by: Name,
    },

    #[error("cannot parse `{raw}` as a {kind} key")]
    InvalidKey { raw: String, kind: KeyKind },

    #[error("invalid schema document: {0}")]
    Document(String),
}
