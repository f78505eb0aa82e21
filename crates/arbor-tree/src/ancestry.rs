//! Ancestor path search: every root-first chain from a target root type
//! down to one record.
//!
//! The search is a depth-bounded DFS over *parent-direction* edges:
//!
//! 1. `ParentLink` fields (many-to-one), in declaration order
//! 2. `MultiPeer` fields that are **not** child edges, in declaration order
//!    (a many-to-many child edge points *down* from this type)
//!
//! A record of the target type ends a path. Distinct chains to the root are
//! all reported, so diamond-shaped ancestry yields one path per chain.
//!
//! Termination comes from the depth bound alone. There is no visited set:
//! a cycle is simply walked until the bound prunes it, which also means a
//! record reachable through a cycle may show up in more than one path.
//!
//! Edge failures (dangling references, backend errors) are isolated to
//! their branch: they contribute no paths and sibling edges are still
//! explored.

use arbor_schema::{EntityRecord, EntityType, RelationKind, Repository, SchemaRegistry};

use crate::node::{PathResult, TreeNode};
use crate::settings::DEFAULT_MAX_DEPTH;

/// Pending exploration step.
struct Frame {
    record: EntityRecord,
    depth: usize,
    /// Nodes from the start record up to (excluding) `record`, leaf first.
    trail: Vec<TreeNode>,
}

pub struct AncestorPathFinder<'a> {
    registry: &'a SchemaRegistry,
    repository: &'a dyn Repository,
    max_depth: usize,
}

impl<'a> AncestorPathFinder<'a> {
    pub fn new(registry: &'a SchemaRegistry, repository: &'a dyn Repository) -> Self {
        Self {
            registry,
            repository,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// All ancestor paths from `start` up to records of `root_type`.
    ///
    /// Paths are root-first, end at `start`, and hold at most
    /// `max_depth + 1` nodes. A `start` of the root type yields exactly one
    /// single-node path.
    pub fn find_paths(&self, start: &EntityRecord, root_type: &str) -> Vec<PathResult> {
        let target = self
            .registry
            .resolve(root_type)
            .map(|ty| ty.name.as_str())
            .unwrap_or(root_type);

        let mut paths = Vec::new();
        let mut pruned = 0usize;
        let mut stack = vec![Frame {
            record: start.clone(),
            depth: 0,
            trail: Vec::with_capacity(self.max_depth + 1),
        }];

        while let Some(Frame {
            record,
            depth,
            mut trail,
        }) = stack.pop()
        {
            if depth > self.max_depth {
                pruned += 1;
                continue;
            }

            trail.push(TreeNode::bare(&record));
            if record.entity_type == target {
                trail.reverse();
                paths.push(PathResult { nodes: trail });
                continue;
            }

            let Some(entity) = self.registry.get(&record.entity_type) else {
                tracing::debug!(entity_type = %record.entity_type, "ancestor search: unknown type");
                continue;
            };

            // Reverse push keeps pops in declaration order.
            let parents = self.parents_of(&record, entity);
            let mut remaining = parents.len();
            for parent in parents.into_iter().rev() {
                remaining -= 1;
                let branch_trail = if remaining == 0 {
                    std::mem::take(&mut trail)
                } else {
                    let mut copy = Vec::with_capacity(self.max_depth + 1);
                    copy.extend_from_slice(&trail);
                    copy
                };
                stack.push(Frame {
                    record: parent,
                    depth: depth + 1,
                    trail: branch_trail,
                });
            }
        }

        tracing::trace!(
            start = %start.key,
            root_type = target,
            paths = paths.len(),
            pruned,
            "ancestor search finished"
        );
        paths
    }

    /// Parent-direction neighbours of `record`: parent links first, then
    /// non-child-edge peers.
    fn parents_of(&self, record: &EntityRecord, entity: &EntityType) -> Vec<EntityRecord> {
        let mut parents = Vec::new();

        for field in entity.fields.iter().filter(|f| f.kind == RelationKind::ParentLink) {
            match self.repository.resolve_one(record, field) {
                Ok(Some(parent)) => parents.push(parent),
                Ok(None) => {}
                Err(err) => tracing::debug!(
                    entity_type = %entity.name,
                    key = %record.key,
                    field = %field.name,
                    error = %err,
                    "ancestor search: skipping parent link"
                ),
            }
        }

        for field in entity
            .fields
            .iter()
            .filter(|f| f.kind == RelationKind::MultiPeer && !f.is_child_edge())
        {
            match self.repository.resolve_many(record, field) {
                Ok(peers) => parents.extend(peers),
                Err(err) => tracing::debug!(
                    entity_type = %entity.name,
                    key = %record.key,
                    field = %field.name,
                    error = %err,
                    "ancestor search: skipping peer edge"
                ),
            }
        }

        parents
    }
}
