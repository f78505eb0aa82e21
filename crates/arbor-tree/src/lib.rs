//! Arbor Tree: virtual hierarchies over a relational object graph
//!
//! The hierarchy is never stored. It is derived on demand from relationship
//! edges declared in the schema:
//!
//! ```text
//!   SchemaRegistry ──► HierarchyConfigStore      (once, at startup)
//!                             │
//!   Repository ◄────── TreeMaterializer          (roots / children)
//!        ▲
//!        └──────────── SearchOrchestrator ──► AncestorPathFinder
//! ```
//!
//! - [`HierarchyConfigStore`]: which types are roots and which of their
//!   fields are child edges. Immutable after discovery.
//! - [`TreeMaterializer`]: decorated root and child nodes from live records.
//! - [`AncestorPathFinder`]: depth-bounded search for every chain from a
//!   record up to a root type.
//! - [`SearchOrchestrator`]: free-text matches placed in the hierarchy, one
//!   hit per ancestor path.
//!
//! [`TreeService`] bundles the three shared inputs (registry, repository,
//! configuration) and exposes the caller-facing operations. All per-request
//! work is stateless; the service can be shared across threads.

pub mod ancestry;
pub mod config;
pub mod materialize;
pub mod node;
pub mod search;
pub mod settings;

use std::sync::Arc;

use arbor_schema::{EntityRecord, Repository, SchemaError, SchemaRegistry};
use thiserror::Error;

pub use ancestry::AncestorPathFinder;
pub use config::{ChildFieldConfig, HierarchyConfigStore, TreeConfiguration, TreeSelection};
pub use materialize::{SkipReason, TreeMaterializer};
pub use node::{PathResult, TreeNode};
pub use search::{SearchHit, SearchOrchestrator};
pub use settings::TreeSettings;

#[derive(Debug, Error)]
pub enum TreeError {
    /// A caller-supplied primary key does not follow its type's parse rule.
    #[error("invalid id for `{entity}`: {source}")]
    InvalidArgument {
        entity: String,
        #[source]
        source: SchemaError,
    },
}

/// Caller-facing entry point.
pub struct TreeService {
    registry: Arc<SchemaRegistry>,
    repository: Arc<dyn Repository>,
    config: HierarchyConfigStore,
    settings: TreeSettings,
}

impl TreeService {
    /// Discover tree configurations and bind them to a repository.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        repository: Arc<dyn Repository>,
        settings: TreeSettings,
    ) -> Self {
        let config = HierarchyConfigStore::discover(&registry, &settings);
        Self {
            registry,
            repository,
            config,
            settings,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &HierarchyConfigStore {
        &self.config
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub fn materializer(&self) -> TreeMaterializer<'_> {
        TreeMaterializer::new(&self.registry, self.repository.as_ref(), &self.config)
    }

    pub fn path_finder(&self) -> AncestorPathFinder<'_> {
        AncestorPathFinder::new(&self.registry, self.repository.as_ref())
            .with_max_depth(self.settings.max_depth)
    }

    pub fn searcher(&self) -> SearchOrchestrator<'_> {
        SearchOrchestrator::new(&self.registry, self.repository.as_ref(), &self.settings)
    }

    pub fn list_tree_configurations(&self) -> &[TreeConfiguration] {
        self.config.all()
    }

    /// Configuration for a root type, by qualified or unambiguous simple name.
    pub fn tree_configuration(&self, root_type: &str) -> Option<&TreeConfiguration> {
        let qualified = self
            .registry
            .resolve(root_type)
            .map(|ty| ty.name.as_str())
            .unwrap_or(root_type);
        self.config.get(qualified)
    }

    /// The requested tree, the default tree, or the "nothing configured" state.
    pub fn select_tree(&self, root_type: Option<&str>) -> TreeSelection<'_> {
        match root_type.and_then(|name| self.tree_configuration(name)) {
            Some(tree) => TreeSelection::Tree(tree),
            None => self.config.landing(),
        }
    }

    pub fn fetch_roots(&self, root_type: &str) -> Vec<TreeNode> {
        self.materializer().fetch_roots(root_type)
    }

    pub fn fetch_children(&self, parent_type: &str, parent_id: &str, field_name: &str) -> Vec<TreeNode> {
        self.materializer()
            .fetch_children(parent_type, parent_id, field_name)
    }

    pub fn try_fetch_children(
        &self,
        parent_type: &str,
        parent_id: &str,
        field_name: &str,
    ) -> Result<Vec<TreeNode>, TreeError> {
        self.materializer()
            .try_fetch_children(parent_type, parent_id, field_name)
    }

    pub fn find_paths(&self, record: &EntityRecord, root_type: &str) -> Vec<PathResult> {
        self.path_finder().find_paths(record, root_type)
    }

    pub fn search(&self, query: &str, root_type: &str) -> Vec<SearchHit> {
        self.searcher().search(query, root_type)
    }
}
