//! Metadata table parsing
//!
//! The metadata table is a CSV file with one row per sample and at least the
//! columns `file_path` and `label`. It is the source of truth for what to
//! load and how to supervise it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::error::{OvitrapError, Result};

/// A single metadata row: which image to load and its binary label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Path to the image file
    pub file_path: PathBuf,
    /// Binary label: 1 = eggs present, 0 = no eggs
    pub label: u8,
}

/// Read and validate the metadata table.
///
/// Fails with [`OvitrapError::Metadata`] if the file is unreadable, a
/// required column is missing, or a label is outside `{0, 1}`. Per-row
/// missing *images* are not checked here; the loader handles those.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<MetadataRecord>> {
    let path = path.as_ref();

    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        OvitrapError::Metadata(format!("cannot read metadata table {:?}: {}", path, e))
    })?;

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<MetadataRecord>().enumerate() {
        let record = result.map_err(|e| {
            OvitrapError::Metadata(format!("malformed metadata row {}: {}", row + 1, e))
        })?;

        if record.label > 1 {
            return Err(OvitrapError::Metadata(format!(
                "row {}: label must be 0 or 1, got {}",
                row + 1,
                record.label
            )));
        }

        records.push(record);
    }

    info!("Loaded {} metadata rows from {:?}", records.len(), path);
    Ok(records)
}
