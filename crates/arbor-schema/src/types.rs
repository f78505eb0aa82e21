//! Entity types, relationship fields and hierarchy markers.

use serde::{Deserialize, Serialize};

use crate::key::KeyKind;
use crate::Name;

/// Cardinality of a relationship field, seen from the declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Many-to-one: at most one referenced record.
    ParentLink,
    /// One-to-many collection.
    MultiChild,
    /// Many-to-many collection.
    MultiPeer,
}

impl RelationKind {
    /// Collection kinds are the only ones a tree can be expanded through.
    pub fn is_collection(self) -> bool {
        matches!(self, RelationKind::MultiChild | RelationKind::MultiPeer)
    }
}

/// Type-level hierarchy marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMarker {
    /// The type is the root of a tree.
    pub root: bool,
    /// Tree label (roots only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Icon used for nodes of this type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Field-level hierarchy marker. Its presence makes the field a child edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMarker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Lower values sort first.
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipField {
    pub name: Name,
    pub kind: RelationKind,
    /// Qualified name of the target type.
    pub target: Name,
    /// Owning field on the target type when this side is the inverse one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_by: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<FieldMarker>,
}

impl RelationshipField {
    pub fn new(name: impl Into<Name>, kind: RelationKind, target: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            mapped_by: None,
            marker: None,
        }
    }

    pub fn mapped_by(mut self, owner: impl Into<Name>) -> Self {
        self.mapped_by = Some(owner.into());
        self
    }

    pub fn child_edge(mut self, marker: FieldMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn is_child_edge(&self) -> bool {
        self.marker.is_some()
    }

    pub fn marker_icon(&self) -> Option<&str> {
        self.marker
            .as_ref()
            .and_then(|m| m.icon.as_deref())
            .filter(|icon| !icon.is_empty())
    }

    pub fn order(&self) -> i32 {
        self.marker.as_ref().map(|m| m.order).unwrap_or(0)
    }
}

/// A declared record schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// Qualified identifier, unique within a registry.
    pub name: Name,
    /// Defaults to the last `.`/`::` segment of `name`.
    #[serde(default)]
    pub simple_name: Name,
    #[serde(default)]
    pub key: KeyKind,
    /// Scalar attribute used as the display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<TypeMarker>,
    #[serde(default)]
    pub fields: Vec<RelationshipField>,
}

impl EntityType {
    pub fn new(name: impl Into<Name>) -> Self {
        let name = name.into();
        Self {
            simple_name: simple_name_of(&name).to_string(),
            name,
            key: KeyKind::default(),
            display_field: None,
            marker: None,
            fields: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: KeyKind) -> Self {
        self.key = key;
        self
    }

    pub fn with_display_field(mut self, field: impl Into<Name>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    pub fn with_marker(mut self, marker: TypeMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn with_field(mut self, field: RelationshipField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_root(&self) -> bool {
        self.marker.as_ref().is_some_and(|m| m.root)
    }

    /// The type's own icon marker, if set and non-empty.
    pub fn icon(&self) -> Option<&str> {
        self.marker
            .as_ref()
            .and_then(|m| m.icon.as_deref())
            .filter(|icon| !icon.is_empty())
    }

    pub fn field(&self, name: &str) -> Option<&RelationshipField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Child-edge fields declared directly on this type, sorted by explicit
    /// order and then by declaration order.
    pub fn child_edges(&self) -> Vec<&RelationshipField> {
        let mut edges: Vec<(usize, &RelationshipField)> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_child_edge())
            .collect();
        edges.sort_by_key(|(idx, f)| (f.order(), *idx));
        edges.into_iter().map(|(_, f)| f).collect()
    }

    pub(crate) fn fill_simple_name(&mut self) {
        if self.simple_name.is_empty() {
            self.simple_name = simple_name_of(&self.name).to_string();
        }
    }
}

fn simple_name_of(qualified: &str) -> &str {
    qualified
        .rsplit(|c| c == '.' || c == ':')
        .next()
        .unwrap_or(qualified)
}
