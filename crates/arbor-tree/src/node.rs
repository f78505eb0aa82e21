//! Transient, per-request view objects.

use arbor_schema::EntityRecord;
use serde::{Deserialize, Serialize};

/// One visible node of a virtual tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Qualified type name.
    #[serde(rename = "type")]
    pub entity_type: String,
    pub is_root: bool,
    pub has_children: bool,
    /// Default field to expand this node through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_label: Option<String>,
    /// Set only when `child_field` is many-to-many: the peer field on the
    /// child type that points back at this node's type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse_field_name: Option<String>,
}

impl TreeNode {
    /// Identity only: id, label and type.
    pub fn bare(record: &EntityRecord) -> Self {
        Self {
            id: record.key.to_string(),
            label: record.display_name.clone(),
            entity_type: record.entity_type.clone(),
            ..Self::default()
        }
    }
}

/// Root-first chain of nodes ending at one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    pub nodes: Vec<TreeNode>,
}

impl PathResult {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes.first()
    }

    /// The record the path was built for.
    pub fn leaf(&self) -> Option<&TreeNode> {
        self.nodes.last()
    }

    /// Every node above the leaf, root first.
    pub fn ancestors(&self) -> &[TreeNode] {
        match self.nodes.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }
}
