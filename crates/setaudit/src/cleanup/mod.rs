//! Safe deletion of everything a selection set does not keep.
//!
//! Cleanup runs in two phases. A [`DeletePlanner`] scans the model once and
//! records stable ids in two tiers. A [`DeletionExecutor`] then resolves the
//! plan against a (cloned) model, spares the preserve set, and deletes the
//! rest inside a single transaction, bisecting rejected batches so one bad
//! element cannot block the others.
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use setaudit::{CategoryRoles, DeletePlanner, DeletionExecutor, MemoryModel, ModelHost, SetAuditConfig};
//!
//! # fn example() -> setaudit::Result<()> {
//! let model = MemoryModel::load("model.json")?;
//! let config = SetAuditConfig::default();
//! let roles = CategoryRoles::classify(&model.categories(), &config.categories);
//! let plan = DeletePlanner::new(&config.cleanup).build(&model, &roles);
//!
//! let mut clone = model.clone();
//! let preserve: BTreeSet<_> = clone.members(&"set-1".into()).unwrap_or_default().into_iter().collect();
//! let report = DeletionExecutor::new(&config.cleanup).run(&mut clone, &preserve, &plan, true)?;
//! println!("Deleted {} elements", report.total_deleted());
//! # Ok(())
//! # }
//! ```

mod executor;
mod planner;
mod report;

pub use executor::{DeletionExecutor, FailureCapture, CLEANUP_TRANSACTION};
pub use planner::{DeletePlan, DeletePlanner};
pub use report::CleanupReport;
