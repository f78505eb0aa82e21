//! The record storage seam.
//!
//! Implementations own the actual data; callers hold [`EntityRecord`]
//! snapshots and go back through the repository for every field read or
//! relationship hop.

use serde::Serialize;
use thiserror::Error;

use crate::key::KeyValue;
use crate::types::{EntityType, RelationshipField};
use crate::Name;

/// A concrete record, as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRecord {
    /// Qualified type name.
    pub entity_type: Name,
    pub key: KeyValue,
    pub display_name: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("unknown entity type `{0}`")]
    UnknownType(Name),

    #[error("type `{entity}` has no field `{field}`")]
    UnknownField { entity: Name, field: Name },

    #[error("field `{entity}.{field}` is not a relationship of the requested kind")]
    NotARelationship { entity: Name, field: Name },

    #[error("`{entity}` record `{key}` does not exist")]
    Dangling { entity: Name, key: String },

    #[error("repository backend failure: {0}")]
    Backend(String),
}

/// Access to stored records.
///
/// All methods are read-only; implementations must be safe to share across
/// concurrent requests.
pub trait Repository: Send + Sync {
    fn find_all(&self, entity: &EntityType) -> Result<Vec<EntityRecord>, RepositoryError>;

    fn find_by_id(
        &self,
        entity: &EntityType,
        key: &KeyValue,
    ) -> Result<Option<EntityRecord>, RepositoryError>;

    /// Free-text search over records of one type. Matching rules belong to
    /// the implementation.
    fn search(&self, entity: &EntityType, query: &str) -> Result<Vec<EntityRecord>, RepositoryError>;

    /// Scalar attribute read; `Ok(None)` when the record has no value.
    fn read_field(&self, record: &EntityRecord, field: &str) -> Result<Option<String>, RepositoryError>;

    /// Follow a `ParentLink` field.
    fn resolve_one(
        &self,
        record: &EntityRecord,
        field: &RelationshipField,
    ) -> Result<Option<EntityRecord>, RepositoryError>;

    /// Follow a `MultiChild` or `MultiPeer` field.
    fn resolve_many(
        &self,
        record: &EntityRecord,
        field: &RelationshipField,
    ) -> Result<Vec<EntityRecord>, RepositoryError>;
}
