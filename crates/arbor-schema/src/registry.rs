//! The validated, immutable set of known entity types.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::EntityType;
use crate::{Name, SchemaError};

/// On-disk form of a registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub types: Vec<EntityType>,
}

impl SchemaDocument {
    pub fn from_json_str(source: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(source).map_err(|e| SchemaError::Document(e.to_string()))
    }

    pub fn into_registry(self) -> Result<SchemaRegistry, SchemaError> {
        SchemaRegistry::new(self.types)
    }
}

/// Known entity types in declaration order.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    types: Vec<EntityType>,
    by_name: HashMap<Name, usize>,
    /// simple name -> index, only for simple names that are unambiguous
    by_simple_name: HashMap<Name, usize>,
}

impl SchemaRegistry {
    pub fn new(mut types: Vec<EntityType>) -> Result<Self, SchemaError> {
        let mut by_name = HashMap::with_capacity(types.len());
        for (idx, ty) in types.iter_mut().enumerate() {
            ty.fill_simple_name();
            if by_name.insert(ty.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateType(ty.name.clone()));
            }
        }

        for ty in &types {
            let mut seen = HashSet::new();
            for field in &ty.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        entity: ty.name.clone(),
                        field: field.name.clone(),
                    });
                }
                let Some(&target_idx) = by_name.get(&field.target) else {
                    return Err(SchemaError::UnknownTarget {
                        entity: ty.name.clone(),
                        field: field.name.clone(),
                        target: field.target.clone(),
                    });
                };
                if let Some(owner) = &field.mapped_by {
                    if types[target_idx].field(owner).is_none() {
                        return Err(SchemaError::UnknownMappedBy {
                            entity: ty.name.clone(),
                            field: field.name.clone(),
                            target: field.target.clone(),
                            mapped_by: owner.clone(),
                        });
                    }
                }
            }
        }

        let mut simple_counts: HashMap<&str, usize> = HashMap::new();
        for ty in &types {
            *simple_counts.entry(ty.simple_name.as_str()).or_default() += 1;
        }
        let by_simple_name = types
            .iter()
            .enumerate()
            .filter(|(_, ty)| simple_counts.get(ty.simple_name.as_str()) == Some(&1))
            .map(|(idx, ty)| (ty.simple_name.clone(), idx))
            .collect();

        Ok(Self {
            types,
            by_name,
            by_simple_name,
        })
    }

    pub fn types(&self) -> &[EntityType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a type by its qualified name only.
    pub fn get(&self, qualified: &str) -> Option<&EntityType> {
        self.by_name.get(qualified).map(|&idx| &self.types[idx])
    }

    /// Look up a type by qualified name, falling back to an unambiguous
    /// simple name.
    pub fn resolve(&self, name: &str) -> Option<&EntityType> {
        self.get(name).or_else(|| {
            self.by_simple_name
                .get(name)
                .map(|&idx| &self.types[idx])
        })
    }

    pub fn roots(&self) -> impl Iterator<Item = &EntityType> {
        self.types.iter().filter(|ty| ty.is_root())
    }
}
