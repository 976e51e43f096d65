//! Writes an approved curate plan back to the model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::host::ModelHost;
use crate::model::{ElementId, SelectionSetRef, SetId};

use super::plan::{CuratePlan, SetDelta};

/// Name of the mutation scope opened by [`CurationApplier::apply`].
pub const APPLY_TRANSACTION: &str = "Curate selection sets";

/// Outcome for one set written by the applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyEntry {
    pub set_name: String,
    pub set_id: SetId,
    pub before_count: usize,
    pub after_count: usize,
    pub added: usize,
    pub removed: usize,
    pub was_ambiguous: bool,
}

/// A delta the applier could not write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSet {
    pub set_name: String,
    pub reason: String,
}

/// Result of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    /// Sets whose membership was rewritten.
    pub entries: Vec<ApplyEntry>,

    /// Deltas that were skipped, with the reason.
    pub skipped: Vec<SkippedSet>,

    /// Whether the mutation scope was committed.
    pub committed: bool,
}

impl ApplySummary {
    /// Number of sets whose membership changed.
    pub fn changed_sets(&self) -> usize {
        self.entries.len()
    }
}

/// Applies [`CuratePlan`] memberships inside a single mutation scope.
#[derive(Debug, Default)]
pub struct CurationApplier;

impl CurationApplier {
    /// Create a new applier.
    pub fn new() -> Self {
        Self
    }

    /// Write the final membership of every changed delta.
    ///
    /// Unresolvable sets and rejected writes are skipped, never fatal. The
    /// scope is committed only when at least one membership actually
    /// changed, and the model is regenerated after the commit.
    pub fn apply<H: ModelHost + ?Sized>(&self, host: &mut H, plan: &CuratePlan) -> Result<ApplySummary> {
        let mut summary = ApplySummary::default();

        let pending: Vec<&SetDelta> = plan
            .deltas
            .iter()
            .filter(|d| d.after_ids != d.before_ids)
            .collect();

        if pending.is_empty() {
            info!("curate plan has no membership changes");
            return Ok(summary);
        }

        let sets = host.selection_sets();
        let mut targets: Vec<(&SetDelta, SelectionSetRef)> = Vec::new();
        for delta in pending {
            match resolve_set(&sets, delta) {
                Some(set) => targets.push((delta, set)),
                None => {
                    warn!(set = %delta.set_name, id = %delta.filter_identity, "selection set not found, skipping");
                    summary.skipped.push(SkippedSet {
                        set_name: delta.set_name.clone(),
                        reason: "selection set not found".to_string(),
                    });
                }
            }
        }

        if targets.is_empty() {
            return Ok(summary);
        }

        host.begin_transaction(APPLY_TRANSACTION)?;

        for (delta, set) in targets {
            let current: BTreeSet<ElementId> = host.members(&set.id).unwrap_or_default().into_iter().collect();
            if current == delta.after_ids {
                continue;
            }

            if let Err(e) = host.set_members(&set.id, &delta.after_ids) {
                warn!(set = %set.name, error = %e, "membership write rejected, skipping");
                summary.skipped.push(SkippedSet {
                    set_name: set.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }

            summary.entries.push(ApplyEntry {
                set_name: set.name,
                set_id: set.id,
                before_count: delta.before_ids.len(),
                after_count: delta.after_ids.len(),
                added: delta.added_count(),
                removed: delta.removed_count(),
                was_ambiguous: delta.was_ambiguous,
            });
        }

        if summary.entries.is_empty() {
            host.rollback();
            info!("no membership changed, rolled back");
            return Ok(summary);
        }

        if let Err(e) = host.commit() {
            host.rollback();
            return Err(e);
        }
        summary.committed = true;

        if let Err(e) = host.regenerate() {
            warn!(error = %e, "regeneration after apply failed");
        }

        info!(
            changed = summary.entries.len(),
            skipped = summary.skipped.len(),
            "applied curate plan"
        );

        Ok(summary)
    }
}

/// Resolve a delta's set by stable identity, falling back to name.
pub(crate) fn resolve_set(sets: &[SelectionSetRef], delta: &SetDelta) -> Option<SelectionSetRef> {
    sets.iter()
        .find(|s| s.id == delta.filter_identity)
        .or_else(|| sets.iter().find(|s| s.name == delta.set_name))
        .cloned()
}
