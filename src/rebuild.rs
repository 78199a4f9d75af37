//! Index rebuild orchestration.
//!
//! A rebuild regenerates the vector index and its metadata from scratch:
//! assemble the corpus, embed it in order, build the index, then persist
//! with a backup-then-write sequence. At most one rebuild runs per process;
//! a second request is rejected, not queued. Progress is published through
//! an owned [`ProgressPublisher`] that any thread can snapshot while the
//! rebuild thread writes it.
//!
//! Failure handling: any error before the persist step leaves the previous
//! index files byte-for-byte untouched, and every attempt — started, failed,
//! or completed — overwrites the on-disk [`RebuildStatus`] record.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::IndexPaths;
use crate::corpus::{self, Document, INTERVIEW_ID_PREFIX};
use crate::embedding::EmbeddingProvider;
use crate::error::{PrimerError, Result};
use crate::index::metadata::{backup_path, backup_stamp};
use crate::index::{FlatIndex, IndexMetadata};
use crate::interviews::InterviewStore;

/// Documents per embedding call during a rebuild.
const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildOutcome {
    InProgress,
    Completed,
    Failed,
}

impl RebuildOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RebuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome record of the most recent rebuild attempt, overwritten on every
/// attempt. Callers poll this to decide whether a rebuild is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildStatus {
    pub status: RebuildOutcome,
    /// RFC 3339 timestamp of the attempt.
    pub last_rebuild: String,
    #[serde(default)]
    pub total_documents: usize,
    #[serde(default)]
    pub original_docs: usize,
    #[serde(default)]
    pub interview_docs: usize,
    pub rebuild_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RebuildStatus {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        crate::index::read_json(path).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::index::write_json_atomic(path, self)
    }
}

/// A point-in-time view of rebuild progress.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    /// 0–100, monotonically non-decreasing within one rebuild.
    pub percent: u8,
    /// Human-readable phase label.
    pub phase: String,
}

/// Shared, last-writer-wins progress record. Cloning shares the underlying
/// slot, so the rebuild thread publishes while any other thread snapshots.
#[derive(Clone, Default)]
pub struct ProgressPublisher {
    inner: Arc<Mutex<Progress>>,
}

impl ProgressPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a checkpoint. Updates that would move the percentage
    /// backwards are dropped, so readers only ever observe forward motion.
    pub fn publish(&self, percent: u8, phase: impl Into<String>) {
        let mut current = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if percent >= current.percent {
            current.percent = percent;
            current.phase = phase.into();
        }
    }

    pub fn snapshot(&self) -> Progress {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Releases the in-flight flag even if the rebuild unwinds.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates full index rebuilds against one set of index paths.
pub struct Rebuilder {
    paths: IndexPaths,
    interviews_path: PathBuf,
    in_flight: AtomicBool,
}

impl Rebuilder {
    pub fn new(paths: IndexPaths, interviews_path: impl Into<PathBuf>) -> Self {
        Self {
            paths,
            interviews_path: interviews_path.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run a full rebuild. Rejects with `RebuildAlreadyInProgress` while
    /// another rebuild on this `Rebuilder` is in flight.
    pub fn rebuild(
        &self,
        provider: &dyn EmbeddingProvider,
        progress: &ProgressPublisher,
    ) -> Result<RebuildStatus> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PrimerError::RebuildAlreadyInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let rebuild_id = Uuid::now_v7().to_string();
        info!(rebuild_id = %rebuild_id, "starting index rebuild");

        let started = RebuildStatus {
            status: RebuildOutcome::InProgress,
            last_rebuild: Local::now().to_rfc3339(),
            total_documents: 0,
            original_docs: 0,
            interview_docs: 0,
            rebuild_id: rebuild_id.clone(),
            error: None,
        };
        if std::fs::create_dir_all(&self.paths.index_dir).is_ok() {
            if let Err(e) = started.save(&self.paths.rebuild_status) {
                warn!(error = %e, "could not record in-progress status");
            }
        }

        match self.run(provider, progress) {
            Ok((total_documents, interview_docs)) => {
                let status = RebuildStatus {
                    status: RebuildOutcome::Completed,
                    last_rebuild: Local::now().to_rfc3339(),
                    total_documents,
                    original_docs: total_documents - interview_docs,
                    interview_docs,
                    rebuild_id,
                    error: None,
                };
                status.save(&self.paths.rebuild_status)?;
                progress.publish(100, "Rebuild complete");
                info!(total_documents, interview_docs, "index rebuild completed");
                Ok(status)
            }
            Err(e) => {
                let status = RebuildStatus {
                    status: RebuildOutcome::Failed,
                    last_rebuild: Local::now().to_rfc3339(),
                    total_documents: 0,
                    original_docs: 0,
                    interview_docs: 0,
                    rebuild_id,
                    error: Some(e.to_string()),
                };
                if let Err(save_err) = status.save(&self.paths.rebuild_status) {
                    warn!(error = %save_err, "could not record failed rebuild status");
                }
                progress.publish(100, format!("Rebuild failed: {e}"));
                Err(e)
            }
        }
    }

    /// Steps 1–4. Returns `(total_documents, interview_docs)` on success.
    fn run(
        &self,
        provider: &dyn EmbeddingProvider,
        progress: &ProgressPublisher,
    ) -> Result<(usize, usize)> {
        progress.publish(0, "Assembling corpus");
        std::fs::create_dir_all(&self.paths.index_dir)
            .map_err(|e| PrimerError::persistence(&self.paths.index_dir, e))?;

        let store = InterviewStore::load(&self.interviews_path)?;
        let documents = corpus::assemble(&self.paths.metadata, &store);
        if documents.is_empty() {
            return Err(PrimerError::NoDocumentsFound);
        }
        info!(total = documents.len(), "corpus assembled");

        progress.publish(20, "Generating embeddings");
        let mut vectors = Vec::with_capacity(documents.len());
        let mut embedded = 0usize;
        for chunk in documents.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = chunk.iter().map(|d| d.text.as_str()).collect();
            vectors.extend(provider.embed_batch(&texts)?);
            embedded += chunk.len();
            let percent = (20 + embedded * 50 / documents.len()) as u8;
            progress.publish(percent, "Generating embeddings");
        }

        progress.publish(70, "Building vector index");
        let index = FlatIndex::build(vectors)?;

        progress.publish(85, "Saving index and metadata");
        self.persist(&documents, &index, provider.model_id())?;

        let interview_docs = documents
            .iter()
            .filter(|d| d.id.starts_with(INTERVIEW_ID_PREFIX))
            .count();
        Ok((documents.len(), interview_docs))
    }

    /// Rename the previous index/metadata pair to timestamped backups, then
    /// write the new pair via temp files and atomic renames.
    fn persist(&self, documents: &[Document], index: &FlatIndex, model: &str) -> Result<()> {
        if self.paths.vector_index.exists() {
            let stamp = backup_stamp(Local::now());
            let index_backup = backup_path(&self.paths.vector_index, &stamp);
            info!(backup = %index_backup.display(), "backing up existing index");
            std::fs::rename(&self.paths.vector_index, &index_backup)
                .map_err(|e| PrimerError::persistence(&self.paths.vector_index, e))?;

            if self.paths.metadata.exists() {
                let metadata_backup = backup_path(&self.paths.metadata, &stamp);
                std::fs::rename(&self.paths.metadata, &metadata_backup)
                    .map_err(|e| PrimerError::persistence(&self.paths.metadata, e))?;
            }
        }

        index.save(&self.paths.vector_index)?;

        let metadata = IndexMetadata {
            texts: documents.iter().map(|d| d.text.clone()).collect(),
            sources: documents.iter().map(|d| d.source.clone()).collect(),
            ids: documents.iter().map(|d| d.id.clone()).collect(),
            last_rebuilt: Local::now().to_rfc3339(),
            total_documents: documents.len(),
            embedding_model: model.to_string(),
        };
        metadata.save(&self.paths.metadata)
    }
}

/// Last rebuild outcome plus a staleness heuristic for operators.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub last_status: Option<RebuildStatus>,
    pub index_exists: bool,
    /// The document store has changed since the metadata was written.
    pub stale: bool,
}

/// Read the current operational state. Never writes.
pub fn status_report(paths: &IndexPaths, interviews_path: &Path) -> StatusReport {
    let last_status = RebuildStatus::load(&paths.rebuild_status).unwrap_or_else(|e| {
        warn!(error = %e, "could not read rebuild status");
        None
    });
    let index_exists = paths.vector_index.exists() && paths.metadata.exists();
    let stale = is_stale(&paths.metadata, interviews_path);
    StatusReport {
        last_status,
        index_exists,
        stale,
    }
}

/// Modification-time comparison between the document store and the index
/// metadata. A store with no index at all counts as stale; no store means
/// there is nothing to go stale against.
fn is_stale(metadata_path: &Path, interviews_path: &Path) -> bool {
    let store_mtime = match std::fs::metadata(interviews_path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    let metadata_mtime = match std::fs::metadata(metadata_path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return true,
    };
    store_mtime > metadata_mtime
}
