//! Document model and corpus assembly.
//!
//! A rebuild embeds one flat, ordered document list merged from two origins:
//! the static base corpus (recovered from the previously persisted metadata)
//! and the interview documents (regenerated fresh from the store on every
//! rebuild, so removed documents actually disappear). The assembled order is
//! deterministic for a fixed snapshot of both inputs — position in this list
//! becomes position in the rebuilt index.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::PrimerError;
use crate::index::IndexMetadata;
use crate::interviews::InterviewStore;

/// Prefix distinguishing interview-origin ids from base-corpus ids.
pub const INTERVIEW_ID_PREFIX: &str = "interview_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOrigin {
    /// Part of the static base corpus carried forward between rebuilds.
    Base,
    /// Attached to an interview; regenerated from the store each rebuild.
    Interview,
}

impl DocumentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Interview => "interview",
        }
    }
}

impl std::fmt::Display for DocumentOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of retrievable text. Immutable once embedded; identified
/// positionally in the index by the order it was submitted for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub source: String,
    pub origin: DocumentOrigin,
}

/// Merge the base corpus and the interview store into the flat candidate
/// list for embedding: base documents in their stored order, then interview
/// documents in interview-then-document order.
///
/// Missing or unreadable persisted metadata degrades to "no base documents"
/// rather than failing the rebuild.
pub fn assemble(metadata_path: &Path, store: &InterviewStore) -> Vec<Document> {
    let mut documents = Vec::new();

    match IndexMetadata::load(metadata_path) {
        Ok(metadata) => {
            for ((text, source), id) in metadata
                .texts
                .iter()
                .zip(&metadata.sources)
                .zip(&metadata.ids)
            {
                // Interview entries in the old metadata are skipped here and
                // regenerated from the store below.
                if id.starts_with(INTERVIEW_ID_PREFIX) {
                    continue;
                }
                documents.push(Document {
                    id: id.clone(),
                    text: text.clone(),
                    source: source.clone(),
                    origin: DocumentOrigin::Base,
                });
            }
            debug!(
                base_documents = documents.len(),
                "loaded base corpus from existing metadata"
            );
        }
        Err(PrimerError::IndexNotFound(_)) => {
            debug!("no existing base corpus");
        }
        Err(e) => {
            warn!(error = %e, "could not read existing metadata, continuing without base corpus");
        }
    }

    for (_, interview) in store.list() {
        for doc in &interview.documents {
            documents.push(Document {
                id: format!("{INTERVIEW_ID_PREFIX}{}", doc.id),
                text: doc.content.clone(),
                source: format!("{} (Interview: {})", doc.source_label(), interview.title),
                origin: DocumentOrigin::Interview,
            });
        }
    }

    documents
}
