//! Project file: the schema document plus an optional `settings` block.
//!
//! ```json
//! { "types": [ ... ], "settings": { "max_depth": 5 } }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arbor_schema::{Repository, SchemaDocument};
use arbor_store::{Dataset, RecordStore};
use arbor_tree::{TreeService, TreeSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(flatten)]
    pub schema: SchemaDocument,
    #[serde(default)]
    pub settings: TreeSettings,
}

impl ProjectFile {
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading project {}", path.display()))?;
        Self::from_json_str(&source).with_context(|| format!("parsing project {}", path.display()))
    }
}

/// Everything a command needs: the service and direct access to the store.
pub struct Workspace {
    pub store: Arc<RecordStore>,
    pub service: TreeService,
}

impl Workspace {
    pub fn open(project: ProjectFile, data: Option<&Path>, max_depth: Option<usize>) -> Result<Self> {
        let registry = Arc::new(project.schema.into_registry().context("invalid schema")?);
        let mut store = RecordStore::new(registry.clone());
        if let Some(path) = data {
            store.load_dataset(&Dataset::from_path(path)?)?;
        }

        let mut settings = project.settings;
        if let Some(depth) = max_depth {
            settings.max_depth = depth;
        }

        let store = Arc::new(store);
        let repository: Arc<dyn Repository> = store.clone();
        tracing::debug!(
            types = registry.len(),
            records = store.len(),
            max_depth = settings.max_depth,
            "workspace opened"
        );
        Ok(Self {
            store,
            service: TreeService::new(registry, repository, settings),
        })
    }
}
