//! JSON datasets: records plus their relationship links.
//!
//! ```json
//! { "records": [
//!     { "type": "garage.Brand", "key": 1, "attrs": { "name": "Fiat" } },
//!     { "type": "garage.Model", "key": 10, "attrs": { "name": "Panda" },
//!       "links": { "brand": [1] } }
//! ] }
//! ```
//!
//! Link keys are parsed with the *target* type's key rule, so records may be
//! listed in any order.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use arbor_schema::RelationKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RecordId, RecordStore, StoreError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub records: Vec<DatasetRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub key: Value,
    #[serde(default)]
    pub attrs: BTreeMap<String, Value>,
    #[serde(default)]
    pub links: BTreeMap<String, Vec<Value>>,
}

impl Dataset {
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading dataset {}", path.display()))?;
        Self::from_json_str(&source).with_context(|| format!("parsing dataset {}", path.display()))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl RecordStore {
    /// Insert every record, then wire every link.
    pub fn load_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        let mut inserted: Vec<RecordId> = Vec::with_capacity(dataset.records.len());

        for rec in &dataset.records {
            let entity = self
                .schema
                .resolve(&rec.entity_type)
                .ok_or_else(|| StoreError::UnknownType(rec.entity_type.clone()))?;
            let key = entity.key.parse(&scalar_text(&rec.key))?;
            let attrs: Vec<(String, String)> = rec
                .attrs
                .iter()
                .map(|(k, v)| (k.clone(), scalar_text(v)))
                .collect();
            let id = self.insert(
                &rec.entity_type,
                key,
                attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
            )?;
            inserted.push(id);
        }

        let schema = self.schema.clone();
        for (rec, &source) in dataset.records.iter().zip(&inserted) {
            let Some(entity) = schema.resolve(&rec.entity_type) else {
                continue;
            };
            for (field_name, keys) in &rec.links {
                let field = entity.field(field_name).ok_or_else(|| StoreError::UnknownField {
                    entity: entity.name.clone(),
                    field: field_name.clone(),
                })?;
                let target_type = schema
                    .get(&field.target)
                    .ok_or_else(|| StoreError::UnknownType(field.target.clone()))?;
                if field.kind == RelationKind::ParentLink && keys.len() > 1 {
                    bail!(
                        "{}.{} holds one {} record but lists {} keys",
                        entity.name,
                        field.name,
                        target_type.name,
                        keys.len()
                    );
                }
                // Owning parent link behind an inverse collection, if any.
                let inverse_parent = field.mapped_by.as_deref().filter(|owner| {
                    target_type
                        .field(owner)
                        .is_some_and(|f| f.kind == RelationKind::ParentLink)
                });

                for raw in keys {
                    let key = target_type.key.parse(&scalar_text(raw))?;
                    let target = self.id_of(&target_type.name, &key).ok_or_else(|| {
                        anyhow!(
                            "{}.{} links to missing {} record `{}`",
                            entity.name,
                            field.name,
                            target_type.name,
                            key
                        )
                    })?;

                    let parent_slot = match (field.kind, inverse_parent) {
                        (RelationKind::ParentLink, _) => Some((source, field.name.as_str(), target)),
                        (_, Some(owner)) => Some((target, owner, source)),
                        _ => None,
                    };
                    if let Some((child, parent_field, parent)) = parent_slot {
                        let current = self.link_targets(child, parent_field);
                        if !current.is_empty() && current != [parent].as_slice() {
                            let record = self.get(child).ok_or(StoreError::UnknownRecord(child))?;
                            bail!(
                                "{} record `{}` has conflicting `{}` links",
                                record.entity_type,
                                record.key,
                                parent_field
                            );
                        }
                    }

                    self.link(source, field_name, target)?;
                }
            }
        }

        tracing::debug!(
            records = inserted.len(),
            "loaded dataset into record store"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arbor_schema::{EntityType, KeyKind, KeyValue, RelationKind, RelationshipField, SchemaRegistry};

    use super::*;

    fn schema() -> Arc<SchemaRegistry> {
        Arc::new(
            SchemaRegistry::new(vec![
                EntityType::new("Shelf").with_key(KeyKind::Text).with_field(
                    RelationshipField::new("books", RelationKind::MultiChild, "Book")
                        .mapped_by("shelf"),
                ),
                EntityType::new("Book")
                    .with_display_field("title")
                    .with_field(RelationshipField::new("shelf", RelationKind::ParentLink, "Shelf")),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn loads_records_in_any_order() {
        let dataset = Dataset::from_json_str(
            r#"{ "records": [
                { "type": "Book", "key": 7, "attrs": { "title": "Dune", "pages": 412 },
                  "links": { "shelf": ["sci-fi"] } },
                { "type": "Shelf", "key": "sci-fi" }
            ] }"#,
        )
        .unwrap();

        let mut store = RecordStore::new(schema());
        store.load_dataset(&dataset).unwrap();

        assert_eq!(store.len(), 2);
        let book = store.id_of("Book", &KeyValue::Integer(7)).unwrap();
        assert_eq!(store.attr(book, "pages"), Some("412"));
        assert_eq!(store.get(book).unwrap().display_name, "Dune");
    }

    #[test]
    fn missing_link_targets_are_rejected() {
        let dataset = Dataset::from_json_str(
            r#"{ "records": [
                { "type": "Book", "key": 1, "links": { "shelf": ["nowhere"] } }
            ] }"#,
        )
        .unwrap();

        let mut store = RecordStore::new(schema());
        let err = store.load_dataset(&dataset).unwrap_err();
        assert!(err.to_string().contains("missing Shelf record"));
    }

    #[test]
    fn parent_links_with_several_keys_are_rejected() {
        let dataset = Dataset::from_json_str(
            r#"{ "records": [
                { "type": "Shelf", "key": "a" },
                { "type": "Shelf", "key": "b" },
                { "type": "Book", "key": 1, "links": { "shelf": ["a", "b"] } }
            ] }"#,
        )
        .unwrap();

        let mut store = RecordStore::new(schema());
        let err = store.load_dataset(&dataset).unwrap_err();
        assert!(err.to_string().contains("Book.shelf"));
    }

    #[test]
    fn inverse_links_land_on_the_owning_field() {
        let dataset = Dataset::from_json_str(
            r#"{ "records": [
                { "type": "Shelf", "key": "a", "links": { "books": [1] } },
                { "type": "Book", "key": 1, "attrs": { "title": "Dune" } },
                { "type": "Book", "key": 2, "links": { "shelf": ["a"] } },
                { "type": "Shelf", "key": "z", "links": { "books": [2] } }
            ] }"#,
        )
        .unwrap();

        let mut store = RecordStore::new(schema());
        let err = store.load_dataset(&dataset).unwrap_err();
        assert!(err.to_string().contains("conflicting `shelf` links"));

        // Without the conflicting shelf, both directions agree.
        let mut consistent = dataset.clone();
        consistent.records.pop();
        let mut store = RecordStore::new(schema());
        store.load_dataset(&consistent).unwrap();

        let book = store.id_of("Book", &KeyValue::Integer(1)).unwrap();
        let shelf = store.id_of("Shelf", &KeyValue::Text("a".into())).unwrap();
        assert_eq!(store.link_targets(book, "shelf"), &[shelf]);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        let dataset = Dataset::from_json_str(r#"{ "records": [ { "type": "Book", "key": "seven" } ] }"#)
            .unwrap();
        let mut store = RecordStore::new(schema());
        assert!(store.load_dataset(&dataset).is_err());
    }

    #[test]
    fn from_path_names_the_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("shelves.json");
        std::fs::write(&good, r#"{ "records": [ { "type": "Shelf", "key": "a" } ] }"#).unwrap();
        assert_eq!(Dataset::from_path(&good).unwrap().records.len(), 1);

        let bad = dir.path().join("broken.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let err = Dataset::from_path(&bad).unwrap_err();
        assert!(err.to_string().contains("broken.json"));

        assert!(Dataset::from_path(&dir.path().join("absent.json")).is_err());
    }
}
