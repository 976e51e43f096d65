//! Selection set curation.
//!
//! A compute pass reconciles every selection set against the element graph:
//! sets with a seed-category member are grown by spatial proximity, stripped
//! of blacklisted and deleted members, and flagged when they overlap another
//! set. The resulting [`CuratePlan`] is reviewed, then written back by the
//! [`CurationApplier`].
//!
//! # Usage
//!
//! ```no_run
//! use setaudit::{CategoryRoles, CurationApplier, CurationEngine, MemoryModel, ModelHost, SetAuditConfig};
//! use setaudit::curation::reconcile_with_model;
//!
//! # fn example() -> setaudit::Result<()> {
//! let mut model = MemoryModel::load("model.json")?;
//! let config = SetAuditConfig::load("setaudit.json")?;
//!
//! let roles = CategoryRoles::classify(&model.categories(), &config.categories);
//! let mut plan = CurationEngine::new(&roles, &config.curation).compute_all(&model);
//!
//! // Leave ambiguous sets for manual review
//! let summary = CurationApplier::new().apply(&mut model, &plan.without_ambiguous())?;
//! println!("Changed {} sets", summary.changed_sets());
//!
//! reconcile_with_model(&mut plan, &model, true);
//! # Ok(())
//! # }
//! ```

mod applier;
mod engine;
mod plan;
mod reconcile;

pub use applier::{ApplyEntry, ApplySummary, CurationApplier, SkippedSet, APPLY_TRANSACTION};
pub use engine::CurationEngine;
pub use plan::{CuratePlan, PlanSummary, SetDelta};
pub use reconcile::{diff, reconcile_with_model, resync, MismatchReport};
