//! Model host trait and failure interception types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{BoundingVolume, Category, Element, ElementId, SelectionSetRef, SetId, ViewId};

/// Severity of a failure raised by the host during a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureSeverity {
    /// Can be dismissed so the mutation proceeds.
    Warning,
    /// Aborts the mutation that raised it.
    Error,
}

/// A failure message raised by the host while a mutation is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    severity: FailureSeverity,
    description: String,
    dismissed: bool,
}

impl HostFailure {
    /// Create a new, undismissed failure.
    pub fn new(severity: FailureSeverity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            dismissed: false,
        }
    }

    /// Severity of the failure.
    pub fn severity(&self) -> FailureSeverity {
        self.severity
    }

    /// Human-readable description.
    pub fn description_text(&self) -> &str {
        &self.description
    }

    /// Dismiss the failure. Errors cannot be dismissed; returns whether the
    /// failure is now dismissed.
    pub fn dismiss(&mut self) -> bool {
        if self.severity == FailureSeverity::Warning {
            self.dismissed = true;
        }
        self.dismissed
    }

    /// Whether the failure was dismissed by an interceptor.
    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }
}

/// Hook invoked by the host for every failure raised during a mutation.
pub trait FailureInterceptor {
    /// Inspect (and optionally dismiss) a failure.
    fn on_failure(&mut self, failure: &mut HostFailure);
}

/// A bulk delete that the host rejected as a whole. Nothing was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRejected {
    /// Description of the first blocking failure.
    pub message: String,
}

impl DeleteRejected {
    /// Create a rejection with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The model host: stores elements, categories, bounds and selection sets,
/// and supports transactional mutation.
///
/// The core never creates or destroys elements directly; it reads through
/// this trait and requests membership writes or deletions. Mutating calls
/// are only valid between `begin_transaction` and `commit`/`rollback`.
pub trait ModelHost {
    /// Identity of the document this host represents.
    fn document_id(&self) -> &str;

    /// Snapshot revision. Changes whenever committed state changes.
    fn revision(&self) -> u64;

    /// The full category universe of the model.
    fn categories(&self) -> Vec<Category>;

    /// Stable ids of every element in the model.
    fn element_ids(&self) -> Vec<ElementId>;

    /// Look up an element. `None` when it no longer exists.
    fn element(&self, id: &ElementId) -> Option<Element>;

    /// Bounds of an element, model-space when `view` is `None`.
    fn bounds(&self, id: &ElementId, view: Option<&ViewId>) -> Option<BoundingVolume>;

    /// Elements whose bounds intersect `volume`, model-wide or restricted to
    /// the given views.
    fn query_by_volume(&self, volume: &BoundingVolume, views: Option<&[ViewId]>) -> Vec<ElementId>;

    /// Every selection set in the model, in host order.
    fn selection_sets(&self) -> Vec<SelectionSetRef>;

    /// Raw members of a set. `None` when the set does not exist.
    fn members(&self, set: &SetId) -> Option<Vec<ElementId>>;

    /// Views associated with a set, used to scope proxy lookups.
    fn set_views(&self, set: &SetId) -> Vec<ViewId>;

    /// Resolve a stable id to an element of this document.
    fn resolve_stable_id(&self, uid: &str) -> Option<ElementId>;

    /// Replace the membership of a set.
    fn set_members(&mut self, set: &SetId, ids: &BTreeSet<ElementId>) -> Result<()>;

    /// Open a mutation scope.
    fn begin_transaction(&mut self, name: &str) -> Result<()>;

    /// Commit the open mutation scope.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open mutation scope. No-op when none is open.
    fn rollback(&mut self);

    /// Regenerate derived model state after a commit.
    fn regenerate(&mut self) -> Result<()>;

    /// Delete elements atomically. Returns the number of elements removed
    /// (including cascaded dependents) or a rejection, in which case nothing
    /// was deleted.
    fn delete_elements(
        &mut self,
        ids: &[ElementId],
        interceptor: &mut dyn FailureInterceptor,
    ) -> std::result::Result<usize, DeleteRejected>;
}
