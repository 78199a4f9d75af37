//! The metadata record persisted alongside the vector index.
//!
//! Three parallel arrays map index position back to document text, source
//! label, and id. The record is created fresh on every rebuild; the previous
//! file is renamed to a timestamped backup rather than deleted, giving a
//! crude undo/audit trail.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PrimerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub texts: Vec<String>,
    pub sources: Vec<String>,
    pub ids: Vec<String>,
    /// RFC 3339 timestamp of the rebuild that produced this record.
    pub last_rebuilt: String,
    pub total_documents: usize,
    /// Model the vectors were produced with. A retriever running a different
    /// provider must refuse to load this index.
    pub embedding_model: String,
}

impl IndexMetadata {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        super::write_json_atomic(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let metadata: Self = super::read_json(path)?;
        if metadata.texts.len() != metadata.ids.len()
            || metadata.sources.len() != metadata.ids.len()
        {
            return Err(PrimerError::corrupt(
                path,
                format!(
                    "parallel arrays are misaligned: {} texts, {} sources, {} ids",
                    metadata.texts.len(),
                    metadata.sources.len(),
                    metadata.ids.len()
                ),
            ));
        }
        Ok(metadata)
    }
}

/// Second-granularity suffix shared by the index and metadata backups of one
/// rebuild.
pub fn backup_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `<name>.backup_<stamp>` in the same directory as `path`.
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.backup_{stamp}"))
}
