//! Arbor Store: an in-memory, index-backed record repository
//!
//! Records are stored column-wise and linked by relationship fields:
//!
//! 1. **String Interning**: type and field names are stored once, referenced by `StrId`
//! 2. **Columnar Attributes**: `field -> (record -> value)`
//! 3. **Type Bitmaps**: `type -> {record ids}` as Roaring bitmaps
//! 4. **Link Indexes**: forward `(source, field) -> targets` and backward
//!    `(target, field) -> sources`, so inverse (`mapped_by`) collections are
//!    answered without storing both directions
//!
//! The store implements [`arbor_schema::Repository`] and is the reference
//! backend for the tree engine and the `arbor` binary.

pub mod dataset;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use arbor_schema::{
    EntityRecord, EntityType, KeyKind, KeyValue, RelationKind, RelationshipField, Repository,
    RepositoryError, SchemaError, SchemaRegistry,
};
use dashmap::DashMap;
use roaring::RoaringBitmap;
use thiserror::Error;

pub use dataset::{Dataset, DatasetRecord};

/// Dense record id, assigned in insertion order.
pub type RecordId = u32;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown entity type `{0}`")]
    UnknownType(String),

    #[error("type `{entity}` has no relationship field `{field}`")]
    UnknownField { entity: String, field: String },

    #[error("`{entity}` already has a record with key `{key}`")]
    DuplicateKey { entity: String, key: KeyValue },

    #[error("`{entity}` expects {expected} keys, got {found}")]
    KeyKindMismatch {
        entity: String,
        expected: KeyKind,
        found: KeyKind,
    },

    #[error("field `{field}` links to `{expected}`, not `{found}`")]
    TargetTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("unknown record id {0}")]
    UnknownRecord(RecordId),

    #[error("field `{field}` is mapped by `{owner}`, which is not an owning field")]
    UnownedInverse { field: String, owner: String },

    #[error("record store is full ({0} records)")]
    Capacity(usize),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// ============================================================================
// String Interning
// ============================================================================

/// Interned string ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct StrId(u32);

/// Maps type and field names to compact IDs.
pub struct StringInterner {
    str_to_id: DashMap<String, StrId>,
    id_to_str: DashMap<StrId, String>,
    next_id: AtomicU32,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            str_to_id: DashMap::new(),
            id_to_str: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Intern a string, returning its ID
    pub fn intern(&self, s: &str) -> StrId {
        if let Some(id) = self.str_to_id.get(s) {
            return *id;
        }

        let id = *self
            .str_to_id
            .entry(s.to_string())
            .or_insert_with(|| StrId(self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.id_to_str.entry(id).or_insert_with(|| s.to_string());
        id
    }

    /// Look up an existing ID for a string without inserting.
    pub fn id_of(&self, s: &str) -> Option<StrId> {
        self.str_to_id.get(s).map(|id| *id)
    }

    pub fn lookup(&self, id: StrId) -> Option<String> {
        self.id_to_str.get(&id).map(|s| s.clone())
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Link Storage
// ============================================================================

#[derive(Debug, Default)]
struct LinkStore {
    /// (source, field) -> targets, in link order
    forward: HashMap<(RecordId, StrId), Vec<RecordId>>,
    /// (target, field) -> sources, in link order
    backward: HashMap<(RecordId, StrId), Vec<RecordId>>,
}

impl LinkStore {
    fn add(&mut self, source: RecordId, field: StrId, target: RecordId) {
        let targets = self.forward.entry((source, field)).or_default();
        if targets.contains(&target) {
            return;
        }
        targets.push(target);
        self.backward.entry((target, field)).or_default().push(source);
    }

    /// Replace every target of `(source, field)` with `target`.
    fn set(&mut self, source: RecordId, field: StrId, target: RecordId) {
        if let Some(old) = self.forward.remove(&(source, field)) {
            for prev in old {
                if let Some(sources) = self.backward.get_mut(&(prev, field)) {
                    sources.retain(|&s| s != source);
                }
            }
        }
        self.add(source, field, target);
    }

    fn targets(&self, source: RecordId, field: StrId) -> &[RecordId] {
        self.forward
            .get(&(source, field))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    fn sources(&self, target: RecordId, field: StrId) -> &[RecordId] {
        self.backward
            .get(&(target, field))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }
}

// ============================================================================
// Record Store
// ============================================================================

/// Id for the record after `len` existing ones.
fn next_record_id(len: usize) -> Result<RecordId, StoreError> {
    RecordId::try_from(len).map_err(|_| StoreError::Capacity(len))
}

#[derive(Debug, Clone)]
struct RecordRow {
    type_id: StrId,
    key: KeyValue,
}

/// Columnar record storage bound to one schema registry.
pub struct RecordStore {
    schema: Arc<SchemaRegistry>,
    interner: StringInterner,
    rows: Vec<RecordRow>,
    /// attr name -> (record -> value)
    attrs: HashMap<StrId, HashMap<RecordId, String>>,
    /// (type, key) -> record
    key_index: HashMap<(StrId, KeyValue), RecordId>,
    /// type -> records of that type
    type_index: HashMap<StrId, RoaringBitmap>,
    links: LinkStore,
}

impl RecordStore {
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self {
            schema,
            interner: StringInterner::new(),
            rows: Vec::new(),
            attrs: HashMap::new(),
            key_index: HashMap::new(),
            type_index: HashMap::new(),
            links: LinkStore::default(),
        }
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a record of `type_name` (qualified or unambiguous simple name).
    pub fn insert(
        &mut self,
        type_name: &str,
        key: impl Into<KeyValue>,
        attrs: Vec<(&str, &str)>,
    ) -> Result<RecordId, StoreError> {
        let entity = self
            .schema
            .resolve(type_name)
            .ok_or_else(|| StoreError::UnknownType(type_name.to_string()))?;
        let key = key.into();
        if key.kind() != entity.key {
            return Err(StoreError::KeyKindMismatch {
                entity: entity.name.clone(),
                expected: entity.key,
                found: key.kind(),
            });
        }

        let type_id = self.interner.intern(&entity.name);
        if self.key_index.contains_key(&(type_id, key.clone())) {
            return Err(StoreError::DuplicateKey {
                entity: entity.name.clone(),
                key,
            });
        }

        let id = next_record_id(self.rows.len())?;
        self.rows.push(RecordRow {
            type_id,
            key: key.clone(),
        });
        self.key_index.insert((type_id, key), id);
        self.type_index.entry(type_id).or_default().insert(id);

        for (name, value) in attrs {
            let attr_id = self.interner.intern(name);
            self.attrs
                .entry(attr_id)
                .or_default()
                .insert(id, value.to_string());
        }

        Ok(id)
    }

    /// Link `source.field -> target`.
    ///
    /// `ParentLink` fields hold at most one target; linking again replaces it.
    /// A link on an inverse (`mapped_by`) field is stored as the owning
    /// side's link `target.owner -> source`, so both directions agree.
    pub fn link(
        &mut self,
        source: RecordId,
        field_name: &str,
        target: RecordId,
    ) -> Result<(), StoreError> {
        let source_type = self.entity_type_of(source)?;
        let target_type = self.entity_type_of(target)?;
        let field = source_type
            .field(field_name)
            .ok_or_else(|| StoreError::UnknownField {
                entity: source_type.name.clone(),
                field: field_name.to_string(),
            })?;
        if field.target != target_type.name {
            return Err(StoreError::TargetTypeMismatch {
                field: format!("{}.{}", source_type.name, field.name),
                expected: field.target.clone(),
                found: target_type.name.clone(),
            });
        }

        if let Some(owner) = field.mapped_by.clone() {
            let owning = target_type.field(&owner).filter(|f| f.mapped_by.is_none());
            if owning.is_none() {
                return Err(StoreError::UnownedInverse {
                    field: format!("{}.{}", source_type.name, field.name),
                    owner,
                });
            }
            return self.link(target, &owner, source);
        }

        let kind = field.kind;
        let field_id = self.interner.intern(field_name);
        match kind {
            RelationKind::ParentLink => self.links.set(source, field_id, target),
            RelationKind::MultiChild | RelationKind::MultiPeer => {
                self.links.add(source, field_id, target)
            }
        }
        Ok(())
    }

    pub fn get(&self, id: RecordId) -> Option<EntityRecord> {
        let row = self.rows.get(id as usize)?;
        let entity = self.entity_for_type_id(row.type_id)?;
        Some(EntityRecord {
            entity_type: entity.name.clone(),
            key: row.key.clone(),
            display_name: self.display_name(id, entity, &row.key),
        })
    }

    /// Record id for a `(type, key)` pair.
    pub fn id_of(&self, type_name: &str, key: &KeyValue) -> Option<RecordId> {
        let entity = self.schema.resolve(type_name)?;
        let type_id = self.interner.id_of(&entity.name)?;
        self.key_index.get(&(type_id, key.clone())).copied()
    }

    /// Stored targets of `source.field`, in link order.
    pub(crate) fn link_targets(&self, source: RecordId, field_name: &str) -> &[RecordId] {
        match self.interner.id_of(field_name) {
            Some(field_id) => self.links.targets(source, field_id),
            None => &[],
        }
    }

    pub fn attr(&self, id: RecordId, name: &str) -> Option<&str> {
        let attr_id = self.interner.id_of(name)?;
        self.attrs.get(&attr_id)?.get(&id).map(String::as_str)
    }

    /// Records of `type_id` with any attribute containing `needle`
    /// (case-insensitive).
    fn records_with_text(&self, type_id: StrId, needle: &str) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return out;
        }
        let Some(candidates) = self.type_index.get(&type_id) else {
            return out;
        };
        for column in self.attrs.values() {
            for id in candidates.iter() {
                if out.contains(id) {
                    continue;
                }
                if column
                    .get(&id)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
                {
                    out.insert(id);
                }
            }
        }
        out
    }

    fn entity_type_of(&self, id: RecordId) -> Result<&EntityType, StoreError> {
        let row = self
            .rows
            .get(id as usize)
            .ok_or(StoreError::UnknownRecord(id))?;
        self.entity_for_type_id(row.type_id)
            .ok_or(StoreError::UnknownRecord(id))
    }

    fn entity_for_type_id(&self, type_id: StrId) -> Option<&EntityType> {
        self.schema.get(&self.interner.lookup(type_id)?)
    }

    fn display_name(&self, id: RecordId, entity: &EntityType, key: &KeyValue) -> String {
        entity
            .display_field
            .as_deref()
            .and_then(|field| self.attr(id, field))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} #{}", entity.simple_name, key))
    }

    fn row_of(&self, record: &EntityRecord) -> Result<RecordId, RepositoryError> {
        self.interner
            .id_of(&record.entity_type)
            .and_then(|type_id| self.key_index.get(&(type_id, record.key.clone())).copied())
            .ok_or_else(|| RepositoryError::Dangling {
                entity: record.entity_type.clone(),
                key: record.key.to_string(),
            })
    }

    fn records(&self, ids: impl IntoIterator<Item = RecordId>) -> Vec<EntityRecord> {
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    fn check_field(
        &self,
        record: &EntityRecord,
        field: &RelationshipField,
        collection: bool,
    ) -> Result<(), RepositoryError> {
        let entity = self
            .schema
            .get(&record.entity_type)
            .ok_or_else(|| RepositoryError::UnknownType(record.entity_type.clone()))?;
        if entity.field(&field.name).is_none() {
            return Err(RepositoryError::UnknownField {
                entity: entity.name.clone(),
                field: field.name.clone(),
            });
        }
        if field.kind.is_collection() != collection {
            return Err(RepositoryError::NotARelationship {
                entity: entity.name.clone(),
                field: field.name.clone(),
            });
        }
        Ok(())
    }

    /// Forward links of `field` plus, for inverse fields, every record whose
    /// owning field points back at `row`.
    fn linked(&self, row: RecordId, field: &RelationshipField) -> Vec<RecordId> {
        let mut out: Vec<RecordId> = self
            .interner
            .id_of(&field.name)
            .map(|field_id| self.links.targets(row, field_id).to_vec())
            .unwrap_or_default();

        if let Some(owner_id) = field
            .mapped_by
            .as_deref()
            .and_then(|owner| self.interner.id_of(owner))
        {
            for &source in self.links.sources(row, owner_id) {
                let is_target_type = self
                    .rows
                    .get(source as usize)
                    .and_then(|r| self.interner.lookup(r.type_id))
                    .is_some_and(|name| name == field.target);
                if is_target_type && !out.contains(&source) {
                    out.push(source);
                }
            }
        }
        out
    }
}

impl Repository for RecordStore {
    fn find_all(&self, entity: &EntityType) -> Result<Vec<EntityRecord>, RepositoryError> {
        if self.schema.get(&entity.name).is_none() {
            return Err(RepositoryError::UnknownType(entity.name.clone()));
        }
        Ok(self
            .interner
            .id_of(&entity.name)
            .and_then(|type_id| self.type_index.get(&type_id))
            .map(|ids| self.records(ids.iter()))
            .unwrap_or_default())
    }

    fn find_by_id(
        &self,
        entity: &EntityType,
        key: &KeyValue,
    ) -> Result<Option<EntityRecord>, RepositoryError> {
        if self.schema.get(&entity.name).is_none() {
            return Err(RepositoryError::UnknownType(entity.name.clone()));
        }
        Ok(self.id_of(&entity.name, key).and_then(|id| self.get(id)))
    }

    fn search(&self, entity: &EntityType, query: &str) -> Result<Vec<EntityRecord>, RepositoryError> {
        let Some(type_id) = self.interner.id_of(&entity.name) else {
            return Ok(Vec::new());
        };
        Ok(self.records(self.records_with_text(type_id, query).iter()))
    }

    fn read_field(&self, record: &EntityRecord, field: &str) -> Result<Option<String>, RepositoryError> {
        let row = self.row_of(record)?;
        Ok(self.attr(row, field).map(str::to_string))
    }

    fn resolve_one(
        &self,
        record: &EntityRecord,
        field: &RelationshipField,
    ) -> Result<Option<EntityRecord>, RepositoryError> {
        self.check_field(record, field, false)?;
        let row = self.row_of(record)?;
        Ok(self.linked(row, field).first().and_then(|&id| self.get(id)))
    }

    fn resolve_many(
        &self,
        record: &EntityRecord,
        field: &RelationshipField,
    ) -> Result<Vec<EntityRecord>, RepositoryError> {
        self.check_field(record, field, true)?;
        let row = self.row_of(record)?;
        Ok(self.records(self.linked(row, field)))
    }
}
