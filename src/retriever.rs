//! Load-once query handle over a persisted index.
//!
//! A [`Retriever`] reads the vector index and its metadata into memory at
//! load time and serves queries from that snapshot for the rest of its life.
//! A completed rebuild does not invalidate an existing handle — picking up
//! the new index requires an explicit [`reload`](Retriever::reload), which
//! replaces the snapshot wholesale.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::IndexPaths;
use crate::embedding::EmbeddingProvider;
use crate::error::{PrimerError, Result};
use crate::index::{FlatIndex, IndexMetadata};

/// A retrieved passage with its provenance label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub text: String,
    pub source: String,
}

pub struct Retriever {
    index: FlatIndex,
    metadata: IndexMetadata,
    provider: Arc<dyn EmbeddingProvider>,
    paths: IndexPaths,
}

impl Retriever {
    /// Read the persisted index and metadata once. Fails with
    /// `IndexNotFound` when either file is absent (run a rebuild first) and
    /// with `ModelMismatch` when the index was built by a different model
    /// than the live provider — searching across models produces
    /// meaningless distances.
    pub fn load(paths: &IndexPaths, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let index = FlatIndex::load(&paths.vector_index)?;
        let metadata = IndexMetadata::load(&paths.metadata)?;

        if metadata.embedding_model != provider.model_id() {
            return Err(PrimerError::ModelMismatch {
                recorded: metadata.embedding_model.clone(),
                live: provider.model_id().to_string(),
            });
        }
        if provider.dimensions() != index.dimension() {
            return Err(PrimerError::DimensionMismatch {
                expected: index.dimension(),
                actual: provider.dimensions(),
            });
        }
        if index.len() != metadata.len() {
            return Err(PrimerError::corrupt(
                &paths.metadata,
                format!(
                    "metadata covers {} documents but the index holds {}",
                    metadata.len(),
                    index.len()
                ),
            ));
        }

        info!(
            documents = index.len(),
            model = %metadata.embedding_model,
            "retriever loaded"
        );

        Ok(Self {
            index,
            metadata,
            provider,
            paths: paths.clone(),
        })
    }

    /// Embed `text`, search the index, and map hits back through the
    /// metadata's parallel arrays. Returns at most `min(k, len)` passages,
    /// nearest first.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<Passage>> {
        let query_vector = self.provider.embed(text)?;
        let hits = self.index.search(&query_vector, k)?;
        Ok(hits
            .into_iter()
            .map(|(position, _)| Passage {
                text: self.metadata.texts[position].clone(),
                source: self.metadata.sources[position].clone(),
            })
            .collect())
    }

    /// Re-read the persisted files, replacing this handle's snapshot
    /// wholesale. Queries running against the old snapshot are unaffected.
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::load(&self.paths, Arc::clone(&self.provider))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }
}
