//! Cleanup run report.

use serde::{Deserialize, Serialize};

/// Outcome of one deletion run. Produced fresh per run.
///
/// Text fields are empty, never absent, when nothing failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Preserve ids that resolved in the target model.
    pub preserved_found: usize,

    /// Elements removed by the priority tier, including cascaded dependents.
    pub priority_deleted: usize,

    /// Elements removed by the other tier, including cascaded dependents.
    pub other_deleted: usize,

    /// Single elements that could not be deleted.
    pub errors: usize,

    /// First rejection message from a delete attempt.
    pub first_error_message: String,

    /// Failure messages raised by the host during the run.
    pub failure_messages_count: usize,

    /// Description of the first host failure.
    pub first_failure_message: String,

    /// Warnings dismissed so the run could proceed.
    pub failure_warnings_suppressed: usize,

    /// Captured failure descriptions, capped per run.
    #[serde(default)]
    pub captured_failures: Vec<String>,

    /// The run was skipped because nothing was preserved and nothing was
    /// planned, or preservation was required and none resolved.
    pub skipped_due_to_no_preserve: bool,
}

impl CleanupReport {
    /// Total elements removed.
    pub fn total_deleted(&self) -> usize {
        self.priority_deleted + self.other_deleted
    }

    /// Whether any single-element deletion failed.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
