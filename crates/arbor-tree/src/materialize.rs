//! Lazy tree materialization: root lists and on-demand children.
//!
//! Nothing here is cached. Every call goes to the repository and decorates
//! fresh nodes from the schema:
//!
//! - `has_children` iff the node's type declares at least one child edge
//! - the first child edge (explicit order, then declaration order) becomes
//!   the node's default `child_field`, with its target type and label
//! - a many-to-many default edge also carries `inverse_field_name`, the peer
//!   field on the child type that points back at the node's type
//!
//! Decoration never drops a node. When part of it cannot be resolved the
//! step reports a [`SkipReason`] and the remaining optional fields stay unset.

use arbor_schema::{EntityRecord, EntityType, RelationKind, Repository, SchemaRegistry};

use crate::config::HierarchyConfigStore;
use crate::node::TreeNode;
use crate::TreeError;

/// Why a node's decoration stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The node's own type is not in the registry.
    UnknownNodeType(String),
    /// The default child field targets a type the registry does not know.
    UnknownChildType { field: String, target: String },
    /// Many-to-many default edge without a peer field pointing back.
    NoInverseField { child_type: String, parent_type: String },
}

pub struct TreeMaterializer<'a> {
    registry: &'a SchemaRegistry,
    repository: &'a dyn Repository,
    config: &'a HierarchyConfigStore,
}

impl<'a> TreeMaterializer<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        repository: &'a dyn Repository,
        config: &'a HierarchyConfigStore,
    ) -> Self {
        Self {
            registry,
            repository,
            config,
        }
    }

    /// One root node per record of `root_type`.
    ///
    /// Unknown types and repository failures yield an empty list.
    pub fn fetch_roots(&self, root_type: &str) -> Vec<TreeNode> {
        let Some(entity) = self.registry.resolve(root_type) else {
            tracing::debug!(root_type, "fetch_roots: unknown type");
            return Vec::new();
        };
        let records = match self.repository.find_all(entity) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(root_type = %entity.name, error = %err, "fetch_roots: listing failed");
                return Vec::new();
            }
        };

        let fallback_icon = self.config.get(&entity.name).map(|tree| tree.icon.clone());
        records
            .iter()
            .map(|record| {
                let mut node = self.node_for(record);
                if node.icon.is_none() {
                    node.icon = fallback_icon.clone();
                }
                node.is_root = true;
                node
            })
            .collect()
    }

    /// Children of one record through one collection field.
    ///
    /// Never fails: every validation problem, including an unparsable
    /// `parent_id`, degrades to an empty list.
    pub fn fetch_children(&self, parent_type: &str, parent_id: &str, field_name: &str) -> Vec<TreeNode> {
        match self.try_fetch_children(parent_type, parent_id, field_name) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::debug!(error = %err, "fetch_children: rejected request");
                Vec::new()
            }
        }
    }

    /// Like [`fetch_children`](Self::fetch_children), but reports a
    /// malformed `parent_id` as [`TreeError::InvalidArgument`].
    pub fn try_fetch_children(
        &self,
        parent_type: &str,
        parent_id: &str,
        field_name: &str,
    ) -> Result<Vec<TreeNode>, TreeError> {
        let Some(entity) = self.registry.resolve(parent_type) else {
            return Ok(Vec::new());
        };
        let Some(field) = entity.field(field_name) else {
            return Ok(Vec::new());
        };
        if !field.kind.is_collection() {
            tracing::debug!(
                parent_type = %entity.name,
                field = field_name,
                kind = ?field.kind,
                "fetch_children: not a collection field"
            );
            return Ok(Vec::new());
        }

        let key = entity
            .key
            .parse(parent_id)
            .map_err(|source| TreeError::InvalidArgument {
                entity: entity.name.clone(),
                source,
            })?;

        let parent = match self.repository.find_by_id(entity, &key) {
            Ok(Some(parent)) => parent,
            Ok(None) => return Ok(Vec::new()),
            Err(err) => {
                tracing::warn!(parent_type = %entity.name, %key, error = %err, "fetch_children: lookup failed");
                return Ok(Vec::new());
            }
        };
        let children = match self.repository.resolve_many(&parent, field) {
            Ok(children) => children,
            Err(err) => {
                tracing::warn!(
                    parent_type = %entity.name,
                    %key,
                    field = field_name,
                    error = %err,
                    "fetch_children: traversal failed"
                );
                return Ok(Vec::new());
            }
        };

        let inherited_icon = field.marker_icon().map(str::to_string);
        Ok(children
            .iter()
            .map(|child| {
                let mut node = self.node_for(child);
                if node.icon.is_none() {
                    node.icon = inherited_icon.clone();
                }
                node
            })
            .collect())
    }

    /// Base node plus decoration; the type's own icon marker if any.
    fn node_for(&self, record: &EntityRecord) -> TreeNode {
        let mut node = TreeNode::bare(record);
        node.icon = self
            .registry
            .get(&record.entity_type)
            .and_then(EntityType::icon)
            .map(str::to_string);
        if let Err(reason) = self.decorate(&mut node) {
            tracing::trace!(id = %node.id, entity_type = %node.entity_type, ?reason, "partial node decoration");
        }
        node
    }

    /// Fill `has_children` and the default-child fields of `node`.
    ///
    /// Fields are filled in order (`child_field`, then `child_type` and
    /// `child_label`, then `inverse_field_name`); on `Err` everything after
    /// the failing step is left unset.
    pub fn decorate(&self, node: &mut TreeNode) -> Result<(), SkipReason> {
        let entity = self
            .registry
            .get(&node.entity_type)
            .ok_or_else(|| SkipReason::UnknownNodeType(node.entity_type.clone()))?;
        let edges = entity.child_edges();
        node.has_children = !edges.is_empty();
        let Some(default_edge) = edges.first() else {
            return Ok(());
        };
        node.child_field = Some(default_edge.name.clone());

        let child_type = self.registry.get(&default_edge.target).ok_or_else(|| {
            SkipReason::UnknownChildType {
                field: default_edge.name.clone(),
                target: default_edge.target.clone(),
            }
        })?;
        node.child_type = Some(child_type.name.clone());
        node.child_label = Some(
            default_edge
                .marker
                .as_ref()
                .and_then(|m| m.child_label.clone())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| child_type.simple_name.clone()),
        );

        if default_edge.kind == RelationKind::MultiPeer {
            let inverse = child_type
                .fields
                .iter()
                .find(|f| f.kind == RelationKind::MultiPeer && f.target == entity.name)
                .ok_or_else(|| SkipReason::NoInverseField {
                    child_type: child_type.name.clone(),
                    parent_type: entity.name.clone(),
                })?;
            node.inverse_field_name = Some(inverse.name.clone());
        }
        Ok(())
    }
}
