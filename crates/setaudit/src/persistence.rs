//! Persistence helpers - save/load JSON files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, SetAuditError};

/// Write `value` as pretty JSON, creating the parent directory if needed.
///
/// `what` names the document in error messages ("curate plan", "model snapshot").
pub(crate) fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| SetAuditError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let file = File::create(path).map_err(|e| SetAuditError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)
        .map_err(|e| SetAuditError::Persistence(format!("Failed to serialize {}: {}", what, e)))
}

/// Read a JSON document written by [`save_json`].
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path).map_err(|e| SetAuditError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        SetAuditError::Persistence(format!(
            "Failed to parse {} '{}': {}",
            what,
            path.display(),
            e
        ))
    })
}
