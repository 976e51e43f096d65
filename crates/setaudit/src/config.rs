//! Configuration for category roles, curation and cleanup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetAuditError};
use crate::model::CategoryId;
use crate::persistence;

/// Category role configuration. Lists are category ids; ids that do not
/// exist in a model are ignored when classifying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Categories whose presence validates a set.
    pub seed: Vec<CategoryId>,

    /// Extra categories eligible for spatial inclusion.
    pub proxy: Vec<CategoryId>,

    /// Categories always excluded and removed. Wins over seed and proxy.
    pub blacklist: Vec<CategoryId>,
}

impl CategoryConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed categories.
    pub fn with_seed<I, C>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CategoryId>,
    {
        self.seed = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the proxy categories.
    pub fn with_proxy<I, C>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CategoryId>,
    {
        self.proxy = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the blacklisted categories.
    pub fn with_blacklist<I, C>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CategoryId>,
    {
        self.blacklist = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Configuration for the curation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Distance added on every side of a set's seed bounds to form its
    /// inclusion volume. Negative values are read as zero.
    pub bb_inflation_offset: f64,

    /// When a set has no associated views, scope proxy lookups to the owner
    /// views of its members. When false such sets get no proxy expansion.
    pub proxy_scope_from_members: bool,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            bb_inflation_offset: 0.5,
            proxy_scope_from_members: true,
        }
    }
}

impl CurationConfig {
    /// Effective inflation distance, clamped to `>= 0`.
    pub fn inflation_offset(&self) -> f64 {
        if self.bb_inflation_offset.is_finite() {
            self.bb_inflation_offset.max(0.0)
        } else {
            0.0
        }
    }

    /// Set the inflation offset.
    pub fn with_inflation_offset(mut self, offset: f64) -> Self {
        self.bb_inflation_offset = offset;
        self
    }
}

/// Configuration for delete planning and execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Category names never deleted because removing them breaks host
    /// geometry definitions.
    pub excluded_category_names: Vec<String>,

    /// Category names deleted in the first tier.
    pub priority_category_names: Vec<String>,

    /// Non-view-specific annotation categories that are still deleted.
    pub always_deletable_categories: Vec<String>,

    /// Skip elements that belong to a group.
    pub exclude_group_members: bool,

    /// Skip the run when no preserve id resolves, even if there is
    /// something to delete.
    pub require_preserved: bool,

    /// Maximum failure descriptions captured per run.
    pub max_captured_failures: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            excluded_category_names: vec![
                "<Sketch>".to_string(),
                "<Area Boundary>".to_string(),
                "<Room Separation>".to_string(),
            ],
            priority_category_names: vec!["Areas".to_string(), "Rooms".to_string()],
            always_deletable_categories: vec!["Grids".to_string()],
            exclude_group_members: true,
            require_preserved: false,
            max_captured_failures: 200,
        }
    }
}

/// Top-level configuration, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetAuditConfig {
    pub categories: CategoryConfig,
    pub curation: CurationConfig,
    pub cleanup: CleanupConfig,
}

impl SetAuditConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the category configuration.
    pub fn with_categories(mut self, categories: CategoryConfig) -> Self {
        self.categories = categories;
        self
    }

    /// Set the curation configuration.
    pub fn with_curation(mut self, curation: CurationConfig) -> Self {
        self.curation = curation;
        self
    }

    /// Set the cleanup configuration.
    pub fn with_cleanup(mut self, cleanup: CleanupConfig) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        persistence::load_json(path.as_ref(), "config").map_err(|e| match e {
            SetAuditError::Persistence(msg) => SetAuditError::Config(msg),
            other => other,
        })
    }

    /// Save the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_json(path.as_ref(), self, "config")
    }
}
