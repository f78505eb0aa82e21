//! Shared fixtures for the tree engine tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use arbor_schema::{
    EntityRecord, EntityType, FieldMarker, KeyKind, KeyValue, RelationKind, RelationshipField,
    Repository, RepositoryError, SchemaRegistry, TypeMarker,
};
use arbor_store::RecordStore;

pub fn root_marker(label: Option<&str>, icon: Option<&str>) -> TypeMarker {
    TypeMarker {
        root: true,
        label: label.map(str::to_string),
        icon: icon.map(str::to_string),
    }
}

pub fn child(label: Option<&str>, icon: Option<&str>, order: i32) -> FieldMarker {
    FieldMarker {
        child_label: label.map(str::to_string),
        icon: icon.map(str::to_string),
        order,
    }
}

/// Brand ─models─► Model ─parts─► Part (many-to-many, Part.models is the
/// inverse side and an ancestor edge for Part).
pub fn garage_schema() -> Arc<SchemaRegistry> {
    Arc::new(
        SchemaRegistry::new(vec![
            EntityType::new("garage.Brand")
                .with_display_field("name")
                .with_marker(root_marker(Some("Vehicle Hierarchy"), Some("bi bi-building")))
                .with_field(
                    RelationshipField::new("models", RelationKind::MultiChild, "garage.Model")
                        .mapped_by("brand")
                        .child_edge(child(Some("Models"), Some("bi bi-car-front"), 1)),
                ),
            EntityType::new("garage.Model")
                .with_display_field("name")
                .with_field(RelationshipField::new(
                    "brand",
                    RelationKind::ParentLink,
                    "garage.Brand",
                ))
                .with_field(
                    RelationshipField::new("parts", RelationKind::MultiPeer, "garage.Part")
                        .child_edge(child(Some("Compatible Parts"), Some("bi bi-gear"), 0)),
                ),
            EntityType::new("garage.Part")
                .with_key(KeyKind::Text)
                .with_display_field("name")
                .with_marker(TypeMarker {
                    icon: Some("bi bi-nut".into()),
                    ..TypeMarker::default()
                })
                .with_field(
                    RelationshipField::new("models", RelationKind::MultiPeer, "garage.Model")
                        .mapped_by("parts"),
                ),
        ])
        .expect("garage schema is valid"),
    )
}

/// Fiat(1) ─► Panda(10), Uno(11); Lancia(2) ─► Ypsilon(20).
/// "oil-filter" fits Panda and Ypsilon; "wiper" fits nothing.
pub fn garage_store() -> RecordStore {
    let mut store = RecordStore::new(garage_schema());
    let fiat = store.insert("Brand", 1, vec![("name", "Fiat")]).unwrap();
    let lancia = store.insert("Brand", 2, vec![("name", "Lancia")]).unwrap();
    let panda = store.insert("Model", 10, vec![("name", "Panda")]).unwrap();
    let uno = store.insert("Model", 11, vec![("name", "Uno")]).unwrap();
    let ypsilon = store.insert("Model", 20, vec![("name", "Ypsilon")]).unwrap();
    let filter = store
        .insert("Part", "oil-filter", vec![("name", "Oil Filter")])
        .unwrap();
    store.insert("Part", "wiper", vec![("name", "Wiper Blade")]).unwrap();

    store.link(panda, "brand", fiat).unwrap();
    store.link(uno, "brand", fiat).unwrap();
    store.link(ypsilon, "brand", lancia).unwrap();
    store.link(panda, "parts", filter).unwrap();
    store.link(ypsilon, "parts", filter).unwrap();
    store
}

pub fn record(store: &RecordStore, type_name: &str, key: impl Into<KeyValue>) -> EntityRecord {
    let id = store
        .id_of(type_name, &key.into())
        .expect("fixture record exists");
    store.get(id).expect("fixture record exists")
}

/// Repository wrapper that fails selected relationship fields and types.
pub struct FlakyRepository<R> {
    pub inner: R,
    pub failing_fields: HashSet<String>,
    pub failing_types: HashSet<String>,
}

impl<R: Repository> FlakyRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            failing_fields: HashSet::new(),
            failing_types: HashSet::new(),
        }
    }

    pub fn fail_field(mut self, field: &str) -> Self {
        self.failing_fields.insert(field.to_string());
        self
    }

    pub fn fail_type(mut self, entity_type: &str) -> Self {
        self.failing_types.insert(entity_type.to_string());
        self
    }

    fn check(&self, entity_type: &str, field: Option<&str>) -> Result<(), RepositoryError> {
        if self.failing_types.contains(entity_type)
            || field.is_some_and(|f| self.failing_fields.contains(f))
        {
            return Err(RepositoryError::Backend(format!(
                "injected failure for {entity_type}"
            )));
        }
        Ok(())
    }
}

impl<R: Repository> Repository for FlakyRepository<R> {
    fn find_all(&self, entity: &EntityType) -> Result<Vec<EntityRecord>, RepositoryError> {
        self.check(&entity.name, None)?;
        self.inner.find_all(entity)
    }

    fn find_by_id(
        &self,
        entity: &EntityType,
        key: &KeyValue,
    ) -> Result<Option<EntityRecord>, RepositoryError> {
        self.check(&entity.name, None)?;
        self.inner.find_by_id(entity, key)
    }

    fn search(&self, entity: &EntityType, query: &str) -> Result<Vec<EntityRecord>, RepositoryError> {
        self.check(&entity.name, None)?;
        self.inner.search(entity, query)
    }

    fn read_field(&self, record: &EntityRecord, field: &str) -> Result<Option<String>, RepositoryError> {
        self.check(&record.entity_type, Some(field))?;
        self.inner.read_field(record, field)
    }

    fn resolve_one(
        &self,
        record: &EntityRecord,
        field: &RelationshipField,
    ) -> Result<Option<EntityRecord>, RepositoryError> {
        self.check("", Some(&field.name))?;
        self.inner.resolve_one(record, field)
    }

    fn resolve_many(
        &self,
        record: &EntityRecord,
        field: &RelationshipField,
    ) -> Result<Vec<EntityRecord>, RepositoryError> {
        self.check("", Some(&field.name))?;
        self.inner.resolve_many(record, field)
    }
}
