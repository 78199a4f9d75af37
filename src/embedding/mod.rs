//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait with two implementations: a local
//! ONNX Runtime model (all-MiniLM-L6-v2, 384 dimensions) and an
//! OpenAI-compatible HTTP API. Both produce L2-normalized vectors, so
//! nearest-by-squared-L2 equals nearest-by-cosine. The provider is created
//! via [`create_provider`] from configuration.

pub mod local;
pub mod remote;

use crate::error::{PrimerError, Result};

/// Trait for embedding text into vectors.
///
/// All methods are synchronous — callers in async contexts should use
/// `tokio::task::spawn_blocking`. Batch embedding preserves input order and
/// is all-or-nothing: a failure on any item aborts the whole batch rather
/// than returning a partial result.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize;

    /// Identifier of the underlying model, recorded in the index metadata so
    /// a later load can detect a provider swap.
    fn model_id(&self) -> &str;
}

/// Reject input that is empty once trimmed.
pub(crate) fn ensure_nonempty(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(PrimerError::EmptyText);
    }
    Ok(())
}

/// Create an embedding provider from config.
///
/// `"local"` runs all-MiniLM-L6-v2 via ONNX Runtime (run `primer model
/// download` first); `"remote"` talks to an OpenAI-compatible `/embeddings`
/// endpoint.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        "remote" => {
            let provider = remote::RemoteEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, remote"),
    }
}
