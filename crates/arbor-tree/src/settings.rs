//! Tunables for discovery, materialization and search.

use serde::{Deserialize, Serialize};

/// Hop limit for ancestor search. Also the only guard against cyclic data.
pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_ROOT_ICON: &str = "bi bi-diagram-3";
pub const DEFAULT_CHILD_ICON: &str = "bi bi-folder";
pub const DEFAULT_BREADCRUMB_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    /// Maximum number of parent hops from a search match.
    pub max_depth: usize,
    /// Icon for tree configurations whose root type sets none.
    pub default_root_icon: String,
    /// Icon for child-field configurations whose marker sets none.
    pub default_child_icon: String,
    pub breadcrumb_separator: String,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_root_icon: DEFAULT_ROOT_ICON.to_string(),
            default_child_icon: DEFAULT_CHILD_ICON.to_string(),
            breadcrumb_separator: DEFAULT_BREADCRUMB_SEPARATOR.to_string(),
        }
    }
}
