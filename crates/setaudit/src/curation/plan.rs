//! Curation plan: per-set membership deltas.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ElementId, SetId};
use crate::persistence;

/// Before/after membership of one selection set.
///
/// Invariant: `after_ids == (before_ids - unresolved_ids - blacklist_removals) ∪ to_add`,
/// with `to_add = after_ids - before_ids` and `to_remove = before_ids - after_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDelta {
    /// Set name at compute time. Display only.
    pub set_name: String,

    /// Stable set identity to resolve against at apply time.
    pub filter_identity: SetId,

    /// Raw membership when the plan was computed.
    pub before_ids: BTreeSet<ElementId>,

    /// Elements the set gains.
    pub to_add: BTreeSet<ElementId>,

    /// Elements the set loses.
    pub to_remove: BTreeSet<ElementId>,

    /// Final membership.
    pub after_ids: BTreeSet<ElementId>,

    /// Members that no longer exist in the model.
    #[serde(default)]
    pub unresolved_ids: BTreeSet<ElementId>,

    /// Members removed because their category is blacklisted.
    #[serde(default)]
    pub blacklist_removals: BTreeSet<ElementId>,

    /// Whether the set overlaps another set by membership or volume.
    pub was_ambiguous: bool,

    /// Human-readable diff summary.
    pub details: String,
}

impl SetDelta {
    /// Number of elements in `after_ids` but not `before_ids`.
    pub fn added_count(&self) -> usize {
        self.after_ids.difference(&self.before_ids).count()
    }

    /// Number of elements in `before_ids` but not `after_ids`.
    pub fn removed_count(&self) -> usize {
        self.before_ids.difference(&self.after_ids).count()
    }

    /// Whether the delta adds or removes anything.
    pub fn has_changes(&self) -> bool {
        !self.to_add.is_empty() || !self.to_remove.is_empty()
    }
}

/// Counts over a plan, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub valid_sets: usize,
    pub ignored_sets: usize,
    pub ambiguous_sets: usize,
    pub changed_sets: usize,
    pub total_added: usize,
    pub total_removed: usize,
}

/// Result of a curation compute pass.
///
/// Invariant: every name in `ambiguous_set_names` is also in `valid_set_names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratePlan {
    /// Document the plan was computed against.
    pub document_id: String,

    /// When the plan was computed.
    pub computed_at: DateTime<Utc>,

    /// Sets containing at least one seed-category member.
    pub valid_set_names: Vec<String>,

    /// Explicitly requested sets that turned out invalid.
    pub ignored_set_names: Vec<String>,

    /// Valid sets that overlap another valid set.
    pub ambiguous_set_names: Vec<String>,

    /// One delta per valid set, in host order.
    pub deltas: Vec<SetDelta>,
}

impl CuratePlan {
    /// An empty plan for `document_id`.
    pub fn empty(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            computed_at: Utc::now(),
            valid_set_names: Vec::new(),
            ignored_set_names: Vec::new(),
            ambiguous_set_names: Vec::new(),
            deltas: Vec::new(),
        }
    }

    /// Whether any delta adds or removes members.
    pub fn any_changes(&self) -> bool {
        self.deltas.iter().any(SetDelta::has_changes)
    }

    /// Deltas that add or remove members.
    pub fn changed_deltas(&self) -> impl Iterator<Item = &SetDelta> {
        self.deltas.iter().filter(|d| d.has_changes())
    }

    /// Find a delta by set name.
    pub fn delta(&self, set_name: &str) -> Option<&SetDelta> {
        self.deltas.iter().find(|d| d.set_name == set_name)
    }

    /// Copy of the plan without ambiguous deltas, for callers whose policy
    /// is to leave ambiguous sets for manual review.
    pub fn without_ambiguous(&self) -> CuratePlan {
        CuratePlan {
            deltas: self
                .deltas
                .iter()
                .filter(|d| !d.was_ambiguous)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Summary counts.
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            valid_sets: self.valid_set_names.len(),
            ignored_sets: self.ignored_set_names.len(),
            ambiguous_sets: self.ambiguous_set_names.len(),
            changed_sets: self.changed_deltas().count(),
            total_added: self.deltas.iter().map(SetDelta::added_count).sum(),
            total_removed: self.deltas.iter().map(SetDelta::removed_count).sum(),
        }
    }

    /// Save the plan to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_json(path.as_ref(), self, "curate plan")
    }

    /// Load a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        persistence::load_json(path.as_ref(), "curate plan")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(keys: &[&str]) -> BTreeSet<ElementId> {
        keys.iter().map(|k| ElementId::from(*k)).collect()
    }

    fn delta(name: &str, before: &[&str], after: &[&str], ambiguous: bool) -> SetDelta {
        let before = ids(before);
        let after = ids(after);
        SetDelta {
            set_name: name.to_string(),
            filter_identity: SetId::from(format!("id-{}", name)),
            to_add: after.difference(&before).cloned().collect(),
            to_remove: before.difference(&after).cloned().collect(),
            before_ids: before,
            after_ids: after,
            unresolved_ids: BTreeSet::new(),
            blacklist_removals: BTreeSet::new(),
            was_ambiguous: ambiguous,
            details: String::new(),
        }
    }

    #[test]
    fn test_counts_and_changes() {
        let d = delta("A", &["1", "2"], &["2", "3", "4"], false);
        assert_eq!(d.added_count(), 2);
        assert_eq!(d.removed_count(), 1);
        assert!(d.has_changes());

        let same = delta("B", &["1"], &["1"], false);
        assert!(!same.has_changes());
    }

    #[test]
    fn test_plan_summary_and_filters() {
        let mut plan = CuratePlan::empty("doc");
        plan.valid_set_names = vec!["A".into(), "B".into()];
        plan.ambiguous_set_names = vec!["B".into()];
        plan.deltas = vec![
            delta("A", &["1"], &["1"], false),
            delta("B", &["1"], &["1", "2"], true),
        ];

        assert!(plan.any_changes());
        assert_eq!(plan.changed_deltas().count(), 1);
        assert_eq!(plan.delta("B").unwrap().added_count(), 1);

        let summary = plan.summary();
        assert_eq!(summary.valid_sets, 2);
        assert_eq!(summary.ambiguous_sets, 1);
        assert_eq!(summary.total_added, 1);

        let safe = plan.without_ambiguous();
        assert_eq!(safe.deltas.len(), 1);
        assert!(!safe.any_changes());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans").join("audit.json");

        let mut plan = CuratePlan::empty("doc");
        plan.valid_set_names = vec!["A".into()];
        plan.deltas = vec![delta("A", &["1"], &["1", "2"], false)];
        plan.save(&path).unwrap();

        let back = CuratePlan::load(&path).unwrap();
        assert_eq!(back, plan);
    }
}
