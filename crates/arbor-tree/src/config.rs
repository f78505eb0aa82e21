//! Tree configuration discovery.
//!
//! Runs once, before any request is served. The resulting
//! [`HierarchyConfigStore`] is immutable and shared by reference.

use std::collections::HashMap;

use arbor_schema::{EntityType, SchemaRegistry};
use serde::{Deserialize, Serialize};

use crate::settings::TreeSettings;

/// Presentation of one child edge of a root type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildFieldConfig {
    pub field_name: String,
    pub label: String,
    pub icon: String,
    pub order: i32,
}

/// One browsable hierarchy, keyed by its root type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfiguration {
    /// Qualified name of the root type.
    pub root_type: String,
    pub label: String,
    pub icon: String,
    /// Ordered by explicit order, then declaration order.
    pub child_fields: Vec<ChildFieldConfig>,
}

impl TreeConfiguration {
    fn from_root(entity: &EntityType, settings: &TreeSettings) -> Self {
        let marker = entity.marker.clone().unwrap_or_default();
        let label = marker
            .label
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| entity.simple_name.clone());
        let icon = marker
            .icon
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| settings.default_root_icon.clone());

        // Only the root's own fields; child edges deeper in the graph are
        // picked up per node by the materializer.
        let child_fields = entity
            .child_edges()
            .into_iter()
            .map(|field| {
                let marker = field.marker.clone().unwrap_or_default();
                ChildFieldConfig {
                    field_name: field.name.clone(),
                    label: marker
                        .child_label
                        .filter(|l| !l.is_empty())
                        .unwrap_or_else(|| field.name.clone()),
                    icon: marker
                        .icon
                        .filter(|i| !i.is_empty())
                        .unwrap_or_else(|| settings.default_child_icon.clone()),
                    order: marker.order,
                }
            })
            .collect();

        Self {
            root_type: entity.name.clone(),
            label,
            icon,
            child_fields,
        }
    }

    pub fn child_field(&self, field_name: &str) -> Option<&ChildFieldConfig> {
        self.child_fields.iter().find(|c| c.field_name == field_name)
    }
}

/// Which tree a caller landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSelection<'a> {
    Tree(&'a TreeConfiguration),
    /// No type is marked as a hierarchy root.
    NothingConfigured,
}

/// Immutable per-root-type tree configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyConfigStore {
    trees: Vec<TreeConfiguration>,
    by_root: HashMap<String, usize>,
}

impl HierarchyConfigStore {
    /// Build one configuration per root-marked type, in registry order.
    ///
    /// Pure: calling it again on the same registry yields an equal store.
    pub fn discover(registry: &SchemaRegistry, settings: &TreeSettings) -> Self {
        let trees: Vec<TreeConfiguration> = registry
            .roots()
            .map(|root| TreeConfiguration::from_root(root, settings))
            .collect();
        let by_root = trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| (tree.root_type.clone(), idx))
            .collect();

        tracing::info!(
            trees = trees.len(),
            types = registry.len(),
            "discovered tree configurations"
        );
        Self { trees, by_root }
    }

    pub fn all(&self) -> &[TreeConfiguration] {
        &self.trees
    }

    pub fn has_trees(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Look up by qualified root type name.
    pub fn get(&self, root_type: &str) -> Option<&TreeConfiguration> {
        self.by_root.get(root_type).map(|&idx| &self.trees[idx])
    }

    pub fn child_field(&self, root_type: &str, field_name: &str) -> Option<&ChildFieldConfig> {
        self.get(root_type)?.child_field(field_name)
    }

    /// The default tree: the first one discovered.
    pub fn landing(&self) -> TreeSelection<'_> {
        match self.trees.first() {
            Some(tree) => TreeSelection::Tree(tree),
            None => TreeSelection::NothingConfigured,
        }
    }

    /// The named tree, or the default tree when the name is unknown.
    pub fn select(&self, root_type: &str) -> TreeSelection<'_> {
        match self.get(root_type) {
            Some(tree) => TreeSelection::Tree(tree),
            None => self.landing(),
        }
    }
}
