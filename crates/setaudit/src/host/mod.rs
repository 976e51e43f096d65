//! The model host seam.
//!
//! The core reads and mutates a model only through [`ModelHost`]. A complete
//! in-memory implementation, [`MemoryModel`], backs the tests and the CLI's
//! JSON snapshots.

mod memory;
mod traits;

pub use memory::{Faults, MemoryModel, StoredElement, StoredSet};
pub use traits::{DeleteRejected, FailureInterceptor, FailureSeverity, HostFailure, ModelHost};
