//! CLI command implementations.

pub mod apply;
pub mod audit;
pub mod cleanup;
pub mod plan_delete;

use std::path::PathBuf;

use setaudit::SetAuditConfig;

/// Load the configuration file, or defaults when none is given.
fn load_config(path: Option<PathBuf>) -> Result<SetAuditConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(SetAuditConfig::load(&path)?),
        None => Ok(SetAuditConfig::default()),
    }
}
