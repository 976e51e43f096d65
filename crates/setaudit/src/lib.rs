//! Setaudit: selection-set audit, curation and safe deletion.
//!
//! Setaudit keeps named selection sets in a spatial element model honest.
//! It grows sets to cover what physically sits around their structural
//! members, strips members that no longer belong, flags sets that overlap,
//! and can delete everything a set does not keep without tripping over
//! elements the host refuses to remove.
//!
//! # Core Principles
//!
//! - **Plan, then apply**: every mutation is computed as a reviewable plan first
//! - **All or nothing**: writes happen inside a single host transaction
//! - **Blacklist wins**: blacklisted categories never survive curation
//!
//! # Example
//!
//! ```no_run
//! use setaudit::{CategoryRoles, CurationEngine, MemoryModel, ModelHost, SetAuditConfig};
//!
//! let model = MemoryModel::load("model.json").unwrap();
//! let config = SetAuditConfig::default();
//! let roles = CategoryRoles::classify(&model.categories(), &config.categories);
//!
//! let plan = CurationEngine::new(&roles, &config.curation).compute_all(&model);
//! for delta in plan.changed_deltas() {
//!     println!("{}: +{} -{}", delta.set_name, delta.added_count(), delta.removed_count());
//! }
//! ```

pub mod cache;
pub mod category;
pub mod cleanup;
pub mod config;
pub mod curation;
pub mod error;
pub mod host;
pub mod model;
mod persistence;

pub use cache::SnapshotCache;
pub use category::CategoryRoles;
pub use cleanup::{CleanupReport, DeletePlan, DeletePlanner, DeletionExecutor, FailureCapture};
pub use config::{CategoryConfig, CleanupConfig, CurationConfig, SetAuditConfig};
pub use curation::{
    ApplySummary, CuratePlan, CurationApplier, CurationEngine, MismatchReport, PlanSummary, SetDelta,
};
pub use error::{Result, SetAuditError};
pub use host::{
    DeleteRejected, FailureInterceptor, FailureSeverity, HostFailure, MemoryModel, ModelHost,
};
pub use model::{
    BoundingVolume, Category, CategoryId, CategoryType, Element, ElementClass, ElementId, Point3,
    SelectionSetRef, SetId, ViewId,
};
