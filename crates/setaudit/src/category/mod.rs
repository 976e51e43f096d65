//! Category roles: seed, proxy and blacklist.
//!
//! Roles are pure set algebra over a model's fixed category universe. The
//! blacklist always wins: a blacklisted category is never seed or proxy.

mod classifier;

pub use classifier::CategoryRoles;
