//! Typed errors for the retrieval core.
//!
//! Library operations return [`PrimerError`] so callers can distinguish
//! contract violations (bad `k`, mismatched dimensions) from environmental
//! failures (missing files, disk errors). CLI entry points wrap these in
//! `anyhow` with context, as usual.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for retrieval-core operations.
pub type Result<T> = std::result::Result<T, PrimerError>;

#[derive(Debug, Error)]
pub enum PrimerError {
    /// The assembled corpus was empty — nothing to embed, nothing touched.
    #[error("no documents found to build the index")]
    NoDocumentsFound,

    /// `FlatIndex::build` was given zero vectors.
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    /// Input text was empty after trimming.
    #[error("cannot embed empty text")]
    EmptyText,

    /// Input text exceeds the provider's sequence limit. Never silently
    /// truncated — the caller decides whether to split or skip.
    #[error("text of {tokens} tokens exceeds the embedding limit of {limit}")]
    EmbeddingTooLarge { tokens: usize, limit: usize },

    /// Tokenization or model inference failed.
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    /// A vector's length does not match the index dimension.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `k` must be at least 1.
    #[error("invalid k: {0} (must be at least 1)")]
    InvalidK(usize),

    /// The persisted index or metadata file is absent. Run a rebuild first.
    #[error("index not found at {}: run a rebuild first", .0.display())]
    IndexNotFound(PathBuf),

    /// A rebuild request arrived while one was in flight. Rejected, not queued.
    #[error("a rebuild is already in progress")]
    RebuildAlreadyInProgress,

    /// The referenced interview does not exist in the store.
    #[error("no interview with id {0}")]
    InterviewNotFound(String),

    /// The loaded metadata records a different embedding model than the live
    /// provider. Searching would produce meaningless distances.
    #[error("index was built with model '{recorded}' but the configured provider is '{live}'")]
    ModelMismatch { recorded: String, live: String },

    /// Disk I/O failed during the backup/write sequence.
    #[error("persistence failure at {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted record exists but could not be decoded.
    #[error("malformed record at {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },
}

impl PrimerError {
    /// Wrap an I/O error with the path it occurred at.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Wrap a decode error with the path of the offending file.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_paths_and_counts() {
        let err = PrimerError::IndexNotFound(PathBuf::from("/tmp/index/vector_index.json"));
        assert!(err.to_string().contains("/tmp/index/vector_index.json"));

        let err = PrimerError::DimensionMismatch {
            expected: 384,
            actual: 512,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("512"));

        let err = PrimerError::ModelMismatch {
            recorded: "all-MiniLM-L6-v2".into(),
            live: "text-embedding-3-small".into(),
        };
        assert!(err.to_string().contains("all-MiniLM-L6-v2"));
    }
}
