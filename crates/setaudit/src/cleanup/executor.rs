//! Preserve-aware, failure-tolerant bulk deletion.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::CleanupConfig;
use crate::error::Result;
use crate::host::{FailureInterceptor, FailureSeverity, HostFailure, ModelHost};
use crate::model::ElementId;

use super::planner::DeletePlan;
use super::report::CleanupReport;

/// Name of the mutation scope opened by [`DeletionExecutor::run`].
pub const CLEANUP_TRANSACTION: &str = "Cleanup unpreserved elements";

/// Failure interceptor that records descriptions and dismisses warnings.
///
/// Error-severity failures are never dismissed.
#[derive(Debug, Clone)]
pub struct FailureCapture {
    suppress_warnings: bool,
    max_messages: usize,
    messages: Vec<String>,
    total: usize,
    suppressed: usize,
}

impl FailureCapture {
    /// Create a capture keeping at most `max_messages` descriptions.
    pub fn new(suppress_warnings: bool, max_messages: usize) -> Self {
        Self {
            suppress_warnings,
            max_messages,
            messages: Vec::new(),
            total: 0,
            suppressed: 0,
        }
    }

    /// Captured descriptions, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Failures seen, including ones beyond the capture cap.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Warnings dismissed.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

impl FailureInterceptor for FailureCapture {
    fn on_failure(&mut self, failure: &mut HostFailure) {
        self.total += 1;
        if self.messages.len() < self.max_messages {
            self.messages.push(failure.description_text().to_string());
        }
        if self.suppress_warnings && failure.severity() == FailureSeverity::Warning && failure.dismiss() {
            self.suppressed += 1;
        }
    }
}

/// Per-tier bookkeeping while bisecting.
#[derive(Debug, Default)]
struct TierOutcome {
    deleted: usize,
    errors: usize,
    first_error: Option<String>,
}

/// Runs a [`DeletePlan`] against a model, sparing a preserve set.
pub struct DeletionExecutor<'a> {
    config: &'a CleanupConfig,
}

impl<'a> DeletionExecutor<'a> {
    /// Create an executor.
    pub fn new(config: &'a CleanupConfig) -> Self {
        Self { config }
    }

    /// Delete everything in `plan` except `preserve_ids`.
    ///
    /// Priority elements go first. Each tier is attempted as one bulk
    /// delete; a rejected batch is bisected down to single elements, and
    /// single elements that still fail are counted as errors. Partial
    /// success is committed.
    pub fn run<H: ModelHost + ?Sized>(
        &self,
        host: &mut H,
        preserve_ids: &BTreeSet<ElementId>,
        plan: &DeletePlan,
        suppress_warnings: bool,
    ) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        let preserved: BTreeSet<ElementId> = preserve_ids
            .iter()
            .filter_map(|uid| host.resolve_stable_id(uid.as_str()))
            .collect();
        report.preserved_found = preserved.len();

        let to_delete = |tier: &BTreeSet<ElementId>| -> Vec<ElementId> {
            tier.iter()
                .filter_map(|uid| host.resolve_stable_id(uid.as_str()))
                .filter(|local| !preserved.contains(local))
                .collect()
        };
        let priority = to_delete(&plan.priority_uids);
        let other = to_delete(&plan.other_uids);

        if report.preserved_found == 0
            && ((priority.is_empty() && other.is_empty()) || self.config.require_preserved)
        {
            warn!(
                document = host.document_id(),
                planned = priority.len() + other.len(),
                "no preserved element resolved, skipping cleanup"
            );
            report.skipped_due_to_no_preserve = true;
            return Ok(report);
        }

        let mut capture = FailureCapture::new(suppress_warnings, self.config.max_captured_failures);

        host.begin_transaction(CLEANUP_TRANSACTION)?;

        let priority_outcome = delete_tier(host, &priority, &mut capture);
        let other_outcome = delete_tier(host, &other, &mut capture);

        if let Err(e) = host.commit() {
            host.rollback();
            return Err(e);
        }

        report.priority_deleted = priority_outcome.deleted;
        report.other_deleted = other_outcome.deleted;
        report.errors = priority_outcome.errors + other_outcome.errors;
        report.first_error_message = priority_outcome
            .first_error
            .or(other_outcome.first_error)
            .unwrap_or_default();
        report.failure_messages_count = capture.total();
        report.first_failure_message = capture.messages().first().cloned().unwrap_or_default();
        report.failure_warnings_suppressed = capture.suppressed();
        report.captured_failures = capture.messages().to_vec();

        info!(
            document = host.document_id(),
            preserved = report.preserved_found,
            priority = report.priority_deleted,
            other = report.other_deleted,
            errors = report.errors,
            suppressed = report.failure_warnings_suppressed,
            "cleanup finished"
        );

        Ok(report)
    }
}

fn delete_tier<H: ModelHost + ?Sized>(host: &mut H, ids: &[ElementId], capture: &mut FailureCapture) -> TierOutcome {
    let mut outcome = TierOutcome::default();
    if !ids.is_empty() {
        delete_bisecting(host, ids, capture, &mut outcome);
    }
    outcome
}

/// Delete `ids` in one call; on rejection split in halves and recurse.
fn delete_bisecting<H: ModelHost + ?Sized>(
    host: &mut H,
    ids: &[ElementId],
    capture: &mut FailureCapture,
    outcome: &mut TierOutcome,
) {
    // Earlier deletions may have cascaded to some of these
    let live: Vec<ElementId> = ids.iter().filter(|id| host.element(id).is_some()).cloned().collect();
    if live.is_empty() {
        return;
    }

    match host.delete_elements(&live, capture) {
        Ok(count) => outcome.deleted += count,
        Err(rejected) => {
            if outcome.first_error.is_none() {
                outcome.first_error = Some(rejected.message.clone());
            }

            if live.len() == 1 {
                warn!(element = %live[0], error = %rejected.message, "element could not be deleted");
                outcome.errors += 1;
                return;
            }

            debug!(batch = live.len(), "bulk delete rejected, bisecting");
            let (left, right) = live.split_at(live.len() / 2);
            delete_bisecting(host, left, capture, outcome);
            delete_bisecting(host, right, capture, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::host::{DeleteRejected, MemoryModel};
    use crate::model::{BoundingVolume, Category, CategoryType, Element, SelectionSetRef, SetId, ViewId};

    /// Host whose stable ids differ from its element ids: `uid-x` resolves to `x`.
    struct PrefixedIds(MemoryModel);

    impl ModelHost for PrefixedIds {
        fn document_id(&self) -> &str {
            self.0.document_id()
        }
        fn revision(&self) -> u64 {
            self.0.revision()
        }
        fn categories(&self) -> Vec<Category> {
            self.0.categories()
        }
        fn element_ids(&self) -> Vec<ElementId> {
            self.0.element_ids()
        }
        fn element(&self, id: &ElementId) -> Option<Element> {
            self.0.element(id)
        }
        fn bounds(&self, id: &ElementId, view: Option<&ViewId>) -> Option<BoundingVolume> {
            self.0.bounds(id, view)
        }
        fn query_by_volume(&self, volume: &BoundingVolume, views: Option<&[ViewId]>) -> Vec<ElementId> {
            self.0.query_by_volume(volume, views)
        }
        fn selection_sets(&self) -> Vec<SelectionSetRef> {
            self.0.selection_sets()
        }
        fn members(&self, set: &SetId) -> Option<Vec<ElementId>> {
            self.0.members(set)
        }
        fn set_views(&self, set: &SetId) -> Vec<ViewId> {
            self.0.set_views(set)
        }
        fn resolve_stable_id(&self, uid: &str) -> Option<ElementId> {
            self.0.resolve_stable_id(uid.strip_prefix("uid-")?)
        }
        fn set_members(&mut self, set: &SetId, ids: &BTreeSet<ElementId>) -> Result<()> {
            self.0.set_members(set, ids)
        }
        fn begin_transaction(&mut self, name: &str) -> Result<()> {
            self.0.begin_transaction(name)
        }
        fn commit(&mut self) -> Result<()> {
            self.0.commit()
        }
        fn rollback(&mut self) {
            self.0.rollback()
        }
        fn regenerate(&mut self) -> Result<()> {
            self.0.regenerate()
        }
        fn delete_elements(
            &mut self,
            ids: &[ElementId],
            interceptor: &mut dyn FailureInterceptor,
        ) -> std::result::Result<usize, DeleteRejected> {
            self.0.delete_elements(ids, interceptor)
        }
    }

    fn uids(keys: &[&str]) -> BTreeSet<ElementId> {
        keys.iter().map(|k| ElementId::new(format!("uid-{}", k))).collect()
    }

    #[test]
    fn test_preserve_matched_after_resolving_stable_ids() {
        let model = MemoryModel::new("doc")
            .with_category(Category::new("walls", "Walls", CategoryType::Model))
            .with_element(Element::new("w1", "walls"), None)
            .with_element(Element::new("w2", "walls"), None)
            .with_element(Element::new("w3", "walls"), None);
        let mut host = PrefixedIds(model);

        let plan = DeletePlan {
            document_id: "doc".to_string(),
            revision: 0,
            priority_uids: BTreeSet::new(),
            other_uids: uids(&["w1", "w2", "w3"]),
        };
        let config = CleanupConfig::default();
        let report = DeletionExecutor::new(&config)
            .run(&mut host, &uids(&["w1"]), &plan, true)
            .unwrap();

        assert_eq!(report.preserved_found, 1);
        assert_eq!(report.other_deleted, 2);
        assert!(host.0.contains(&ElementId::from("w1")));
        assert_eq!(host.0.element_count(), 1);
    }

    #[test]
    fn test_capture_caps_messages_and_suppresses_warnings() {
        let mut capture = FailureCapture::new(true, 2);

        for i in 0..3 {
            let mut warning = HostFailure::new(FailureSeverity::Warning, format!("warning {}", i));
            capture.on_failure(&mut warning);
            assert!(warning.is_dismissed());
        }
        let mut error = HostFailure::new(FailureSeverity::Error, "error");
        capture.on_failure(&mut error);
        assert!(!error.is_dismissed());

        assert_eq!(capture.total(), 4);
        assert_eq!(capture.messages(), &["warning 0".to_string(), "warning 1".to_string()]);
        assert_eq!(capture.suppressed(), 3);
    }

    #[test]
    fn test_capture_keeps_warnings_when_not_suppressing() {
        let mut capture = FailureCapture::new(false, 200);
        let mut warning = HostFailure::new(FailureSeverity::Warning, "overlap");
        capture.on_failure(&mut warning);

        assert!(!warning.is_dismissed());
        assert_eq!(capture.suppressed(), 0);
        assert_eq!(capture.total(), 1);
    }
}
