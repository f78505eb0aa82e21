//! Free-text search with hierarchical context.

use arbor_schema::{Repository, SchemaRegistry};
use serde::{Deserialize, Serialize};

use crate::ancestry::AncestorPathFinder;
use crate::node::PathResult;
use crate::settings::TreeSettings;

/// One match at one position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub match_id: String,
    /// Ancestor labels and the match's display name, joined by the separator.
    pub breadcrumb: String,
    pub match_type: String,
    /// Root-to-match ids, for expanding the tree down to the match.
    pub path_ids: Vec<String>,
}

pub struct SearchOrchestrator<'a> {
    registry: &'a SchemaRegistry,
    repository: &'a dyn Repository,
    settings: &'a TreeSettings,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        repository: &'a dyn Repository,
        settings: &'a TreeSettings,
    ) -> Self {
        Self {
            registry,
            repository,
            settings,
        }
    }

    /// Search every known type and place each match under `root_type`.
    ///
    /// A match with N ancestor paths produces N hits; a match with none
    /// produces no hit.
    pub fn search(&self, query: &str, root_type: &str) -> Vec<SearchHit> {
        let finder = AncestorPathFinder::new(self.registry, self.repository)
            .with_max_depth(self.settings.max_depth);
        let mut hits = Vec::new();

        for entity in self.registry.types() {
            let matches = match self.repository.search(entity, query) {
                Ok(matches) => matches,
                Err(err) => {
                    tracing::warn!(entity_type = %entity.name, error = %err, "search: type skipped");
                    continue;
                }
            };

            for record in &matches {
                for path in finder.find_paths(record, root_type) {
                    hits.push(SearchHit {
                        match_id: record.key.to_string(),
                        breadcrumb: self.breadcrumb(&path, &record.display_name),
                        match_type: entity.name.clone(),
                        path_ids: path.ids(),
                    });
                }
            }
        }

        tracing::debug!(query, root_type, hits = hits.len(), "search finished");
        hits
    }

    fn breadcrumb(&self, path: &PathResult, display_name: &str) -> String {
        let ancestors = path.ancestors();
        if ancestors.is_empty() {
            return display_name.to_string();
        }
        let sep = self.settings.breadcrumb_separator.as_str();
        let mut label = ancestors
            .iter()
            .map(|node| node.label.as_str())
            .collect::<Vec<_>>()
            .join(sep);
        label.push_str(sep);
        label.push_str(display_name);
        label
    }
}
