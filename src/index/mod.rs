//! The persisted vector index and its paired metadata record.
//!
//! Both artifacts are JSON files rewritten as a pair on every rebuild; their
//! positions stay aligned 1:1, which is what lets a search hit map back to
//! the text and source it was embedded from.

pub mod flat;
pub mod metadata;

pub use flat::FlatIndex;
pub use metadata::IndexMetadata;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::{PrimerError, Result};

/// Write a record as JSON via a temp file and an atomic rename into place.
/// A crash mid-write leaves the previous file intact.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PrimerError::persistence(path, e.into()))?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json).map_err(|e| PrimerError::persistence(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| PrimerError::persistence(path, e))?;
    Ok(())
}

/// Read a JSON record. A missing file is `IndexNotFound`; a present but
/// undecodable file is `Corrupt`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(PrimerError::IndexNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| PrimerError::persistence(path, e))?;
    serde_json::from_str(&contents).map_err(|e| PrimerError::corrupt(path, e.to_string()))
}
