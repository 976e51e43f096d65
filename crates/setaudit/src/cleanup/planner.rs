//! Delete planning: which elements a cleanup pass may remove.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::category::CategoryRoles;
use crate::config::CleanupConfig;
use crate::error::Result;
use crate::host::ModelHost;
use crate::model::{CategoryType, Element, ElementId};
use crate::persistence;

/// Two disjoint tiers of stable element ids.
///
/// Built once per model snapshot. Ids are stable, so the same plan can be
/// re-resolved against every clone of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePlan {
    /// Document the plan was built from.
    pub document_id: String,

    /// Snapshot revision the plan was built from.
    pub revision: u64,

    /// Area/room-like elements, deleted first.
    pub priority_uids: BTreeSet<ElementId>,

    /// Everything else.
    pub other_uids: BTreeSet<ElementId>,
}

impl DeletePlan {
    /// Total number of planned deletions.
    pub fn len(&self) -> usize {
        self.priority_uids.len() + self.other_uids.len()
    }

    /// Whether nothing is planned.
    pub fn is_empty(&self) -> bool {
        self.priority_uids.is_empty() && self.other_uids.is_empty()
    }

    /// Save the plan to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_json(path.as_ref(), self, "delete plan")
    }

    /// Load a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        persistence::load_json(path.as_ref(), "delete plan")
    }
}

/// Why an element is kept out of a delete plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exclusion {
    Ineligible,
    Blacklisted,
    ViewLike,
    ExcludedName,
    Grouped,
    GlobalAnnotation,
}

/// Builds a [`DeletePlan`] by scanning every element once.
pub struct DeletePlanner<'a> {
    config: &'a CleanupConfig,
}

impl<'a> DeletePlanner<'a> {
    /// Create a planner.
    pub fn new(config: &'a CleanupConfig) -> Self {
        Self { config }
    }

    /// Classify every deletable element of the model into a tier.
    pub fn build<H: ModelHost + ?Sized>(&self, host: &H, roles: &CategoryRoles) -> DeletePlan {
        let mut plan = DeletePlan {
            document_id: host.document_id().to_string(),
            revision: host.revision(),
            ..DeletePlan::default()
        };

        let mut excluded = 0usize;
        for id in host.element_ids() {
            let Some(element) = host.element(&id) else {
                continue;
            };

            if let Some(reason) = self.exclusion(&element, roles) {
                debug!(element = %id, ?reason, "kept out of delete plan");
                excluded += 1;
                continue;
            }

            let name = roles.category_name(&element.category);
            if contains_name(&self.config.priority_category_names, name) {
                plan.priority_uids.insert(id);
            } else {
                plan.other_uids.insert(id);
            }
        }

        info!(
            document = %plan.document_id,
            priority = plan.priority_uids.len(),
            other = plan.other_uids.len(),
            excluded,
            "built delete plan"
        );

        plan
    }

    fn exclusion(&self, element: &Element, roles: &CategoryRoles) -> Option<Exclusion> {
        let category = &element.category;
        let category_type = roles.category_type(category);
        let name = roles.category_name(category);

        if !category_type.is_eligible() {
            return Some(Exclusion::Ineligible);
        }
        if roles.is_blacklisted(category) {
            return Some(Exclusion::Blacklisted);
        }
        if element.class.is_view_like() {
            return Some(Exclusion::ViewLike);
        }
        if contains_name(&self.config.excluded_category_names, name) {
            return Some(Exclusion::ExcludedName);
        }
        if self.config.exclude_group_members && element.group.is_some() {
            return Some(Exclusion::Grouped);
        }
        if category_type == CategoryType::Annotation
            && !element.view_specific
            && !contains_name(&self.config.always_deletable_categories, name)
        {
            return Some(Exclusion::GlobalAnnotation);
        }
        None
    }
}

fn contains_name(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryConfig;
    use crate::host::MemoryModel;
    use crate::model::{Category, ElementClass};

    fn model() -> MemoryModel {
        MemoryModel::new("doc")
            .with_category(Category::new("areas", "Areas", CategoryType::Model))
            .with_category(Category::new("walls", "Walls", CategoryType::Model))
            .with_category(Category::new("views", "Views", CategoryType::Model))
            .with_category(Category::new("tags", "Door Tags", CategoryType::Annotation))
            .with_category(Category::new("internal", "Internal", CategoryType::Other))
            .with_element(Element::new("a1", "areas"), None)
            .with_element(Element::new("w1", "walls"), None)
            .with_element(Element::new("w2", "walls").in_group("g1"), None)
            .with_element(Element::new("v1", "views").with_class(ElementClass::View), None)
            .with_element(Element::new("tag1", "tags").in_view("plan"), None)
            .with_element(Element::new("x1", "internal"), None)
    }

    #[test]
    fn test_tiers_and_exclusions() {
        let model = model();
        let roles = CategoryRoles::classify(&model.categories(), &CategoryConfig::new());
        let config = CleanupConfig::default();

        let plan = DeletePlanner::new(&config).build(&model, &roles);

        assert_eq!(plan.priority_uids, [ElementId::from("a1")].into_iter().collect());
        assert_eq!(
            plan.other_uids,
            [ElementId::from("tag1"), ElementId::from("w1")].into_iter().collect()
        );
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_group_members_included_when_configured() {
        let model = model();
        let roles = CategoryRoles::classify(&model.categories(), &CategoryConfig::new());
        let config = CleanupConfig {
            exclude_group_members: false,
            ..CleanupConfig::default()
        };

        let plan = DeletePlanner::new(&config).build(&model, &roles);
        assert!(plan.other_uids.contains(&ElementId::from("w2")));
    }

    #[test]
    fn test_blacklist_excluded() {
        let model = model();
        let roles = CategoryRoles::classify(&model.categories(), &CategoryConfig::new().with_blacklist(["walls"]));
        let plan = DeletePlanner::new(&CleanupConfig::default()).build(&model, &roles);

        assert!(!plan.other_uids.contains(&ElementId::from("w1")));
    }
}
