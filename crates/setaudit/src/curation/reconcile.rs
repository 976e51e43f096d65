//! Post-apply reconciliation of a plan against the model's actual state.
//!
//! [`diff`] is a pure audit, [`resync`] overwrites the plan with observed
//! membership, and [`reconcile_with_model`] does both.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::ModelHost;
use crate::model::{ElementId, SetId};

use super::applier::resolve_set;
use super::plan::CuratePlan;

/// Difference between a delta's expected membership and the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchReport {
    pub set_name: String,
    pub set_id: SetId,

    /// Whether the set could be resolved at all.
    pub found: bool,

    /// Expected members absent from the model's set.
    pub missing: BTreeSet<ElementId>,

    /// Members present in the model's set but not expected.
    pub unexpected: BTreeSet<ElementId>,
}

impl MismatchReport {
    /// Whether the model matches the plan for this set.
    pub fn is_clean(&self) -> bool {
        self.found && self.missing.is_empty() && self.unexpected.is_empty()
    }

    /// One-line note for a delta's details.
    pub fn note(&self) -> String {
        if !self.found {
            "Reconcile: selection set not found in model".to_string()
        } else {
            format!(
                "Reconcile: {} missing, {} unexpected",
                self.missing.len(),
                self.unexpected.len()
            )
        }
    }
}

/// Compare every delta's `after_ids` with the set's actual membership.
pub fn diff<H: ModelHost + ?Sized>(plan: &CuratePlan, host: &H) -> Vec<MismatchReport> {
    let sets = host.selection_sets();

    plan.deltas
        .iter()
        .map(|delta| {
            let actual = resolve_set(&sets, delta)
                .and_then(|set| host.members(&set.id))
                .map(|m| m.into_iter().collect::<BTreeSet<_>>());

            match actual {
                Some(actual) => MismatchReport {
                    set_name: delta.set_name.clone(),
                    set_id: delta.filter_identity.clone(),
                    found: true,
                    missing: delta.after_ids.difference(&actual).cloned().collect(),
                    unexpected: actual.difference(&delta.after_ids).cloned().collect(),
                },
                None => MismatchReport {
                    set_name: delta.set_name.clone(),
                    set_id: delta.filter_identity.clone(),
                    found: false,
                    missing: delta.after_ids.clone(),
                    unexpected: BTreeSet::new(),
                },
            }
        })
        .collect()
}

/// Overwrite each delta with the observed membership: `before_ids` and
/// `after_ids` become the actual state and the diff is cleared. Deltas whose
/// set cannot be resolved are left untouched.
pub fn resync<H: ModelHost + ?Sized>(plan: &mut CuratePlan, host: &H) {
    let sets = host.selection_sets();

    for delta in &mut plan.deltas {
        let Some(actual) = resolve_set(&sets, delta).and_then(|set| host.members(&set.id)) else {
            warn!(set = %delta.set_name, "cannot resync, selection set not found");
            continue;
        };

        let actual: BTreeSet<ElementId> = actual.into_iter().collect();
        delta.before_ids = actual.clone();
        delta.after_ids = actual;
        delta.to_add.clear();
        delta.to_remove.clear();
        delta.unresolved_ids.clear();
        delta.blacklist_removals.clear();
    }
}

/// Audit then resync. When `annotate` is set, mismatching deltas get a note
/// appended to their details. Returns the audit.
///
/// Calling this twice loses the original diff: the second call sees the
/// already-resynced plan.
pub fn reconcile_with_model<H: ModelHost + ?Sized>(
    plan: &mut CuratePlan,
    host: &H,
    annotate: bool,
) -> Vec<MismatchReport> {
    let reports = diff(plan, host);

    if annotate {
        for (delta, report) in plan.deltas.iter_mut().zip(&reports) {
            if !report.is_clean() {
                if !delta.details.is_empty() {
                    delta.details.push('\n');
                }
                delta.details.push_str(&report.note());
            }
        }
    }

    resync(plan, host);
    reports
}
