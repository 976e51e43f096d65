//! Category role classification.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CategoryConfig;
use crate::model::{Category, CategoryId, CategoryType};

/// Categories used as seed when the configured seed list is empty after
/// blacklist subtraction. Matched by name, case-insensitively.
const FALLBACK_SEED_NAMES: &[&str] = &["Walls", "Floors", "Roofs", "Ceilings"];

/// The three disjoint category roles of a model.
///
/// Blacklisted categories never appear in `seed` or `proxy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRoles {
    pub seed: BTreeSet<CategoryId>,
    pub proxy: BTreeSet<CategoryId>,
    pub blacklist: BTreeSet<CategoryId>,

    /// Whether `seed` came from the built-in fallback list.
    #[serde(default)]
    pub used_fallback_seed: bool,

    /// Category type of every category in the universe.
    #[serde(default)]
    types: HashMap<CategoryId, CategoryType>,

    /// Display name of every category in the universe.
    #[serde(default)]
    names: HashMap<CategoryId, String>,
}

impl CategoryRoles {
    /// Classify a category universe against the configured id lists.
    pub fn classify(universe: &[Category], config: &CategoryConfig) -> Self {
        let known: BTreeSet<&CategoryId> = universe.iter().map(|c| &c.id).collect();
        let pick = |ids: &[CategoryId]| -> BTreeSet<CategoryId> {
            ids.iter().filter(|id| known.contains(id)).cloned().collect()
        };

        let blacklist = pick(&config.blacklist);
        let mut seed: BTreeSet<CategoryId> = pick(&config.seed).difference(&blacklist).cloned().collect();
        let proxy: BTreeSet<CategoryId> = pick(&config.proxy).difference(&blacklist).cloned().collect();

        let mut used_fallback_seed = false;
        if seed.is_empty() {
            seed = universe
                .iter()
                .filter(|c| {
                    FALLBACK_SEED_NAMES
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&c.name))
                })
                .map(|c| c.id.clone())
                .filter(|id| !blacklist.contains(id))
                .collect();
            used_fallback_seed = true;
            debug!(seed = seed.len(), "seed categories empty, using fallback");
        }

        Self {
            seed,
            proxy,
            blacklist,
            used_fallback_seed,
            types: universe.iter().map(|c| (c.id.clone(), c.category_type)).collect(),
            names: universe.iter().map(|c| (c.id.clone(), c.name.clone())).collect(),
        }
    }

    pub fn is_seed(&self, id: &CategoryId) -> bool {
        self.seed.contains(id)
    }

    pub fn is_proxy(&self, id: &CategoryId) -> bool {
        self.proxy.contains(id)
    }

    pub fn is_blacklisted(&self, id: &CategoryId) -> bool {
        self.blacklist.contains(id)
    }

    /// Category type, `Other` for categories outside the universe.
    pub fn category_type(&self, id: &CategoryId) -> CategoryType {
        self.types.get(id).copied().unwrap_or(CategoryType::Other)
    }

    /// Display name, falling back to the id.
    pub fn category_name<'a>(&'a self, id: &'a CategoryId) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id.as_str())
    }
}
