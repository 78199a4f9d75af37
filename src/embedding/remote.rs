//! Remote embedding provider for OpenAI-compatible `/embeddings` endpoints.
//!
//! One HTTP call embeds a whole batch. The response is reordered by the
//! `index` field so output order always matches input order, and any missing
//! item fails the whole call — callers never see a partial batch.

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use super::local::l2_normalize;
use super::{ensure_nonempty, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::error::PrimerError;

/// Token limit of the OpenAI embedding endpoints, enforced client-side from
/// a character-count estimate so oversized inputs fail as `EmbeddingTooLarge`
/// instead of an opaque HTTP 400.
const MAX_INPUT_TOKENS: usize = 8191;
const APPROX_CHARS_PER_TOKEN: usize = 4;

pub struct RemoteEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl RemoteEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!(
                "embedding API key not found: set the {} environment variable",
                config.api_key_env
            )
        })?;

        let endpoint = format!("{}/embeddings", config.api_base.trim_end_matches('/'));
        tracing::info!(endpoint = %endpoint, model = %config.model, "remote embedding provider configured");

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key,
            model: config.model.clone(),
            dimensions: config.remote_dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Reorder response items by their `index` field into input order. The API
/// may return items in any order; a count or index mismatch aborts the batch.
fn vectors_in_input_order(
    mut items: Vec<EmbeddingItem>,
    expected: usize,
) -> crate::error::Result<Vec<Vec<f32>>> {
    if items.len() != expected {
        return Err(PrimerError::EmbeddingFailed(format!(
            "embeddings API returned {} items for {} inputs",
            items.len(),
            expected
        )));
    }
    items.sort_by_key(|item| item.index);
    for (position, item) in items.iter().enumerate() {
        if item.index != position {
            return Err(PrimerError::EmbeddingFailed(
                "embeddings API response skipped an input index".into(),
            ));
        }
    }
    Ok(items
        .into_iter()
        .map(|item| l2_normalize(&item.embedding))
        .collect())
}

impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
        let results = self.embed_batch(&[text])?;
        Ok(results.into_iter().next().expect("batch had one input"))
    }

    fn embed_batch(&self, texts: &[&str]) -> crate::error::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        for text in texts {
            ensure_nonempty(text)?;
            let estimated = text.chars().count().div_ceil(APPROX_CHARS_PER_TOKEN);
            if estimated > MAX_INPUT_TOKENS {
                return Err(PrimerError::EmbeddingTooLarge {
                    tokens: estimated,
                    limit: MAX_INPUT_TOKENS,
                });
            }
        }

        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .map_err(|e| PrimerError::EmbeddingFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PrimerError::EmbeddingFailed(format!(
                "embeddings API returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .map_err(|e| PrimerError::EmbeddingFailed(format!("malformed API response: {e}")))?;

        let vectors = vectors_in_input_order(parsed.data, texts.len())?;
        for vector in &vectors {
            if vector.len() != self.dimensions {
                return Err(PrimerError::EmbeddingFailed(format!(
                    "embeddings API returned {} dimensions, expected {}",
                    vector.len(),
                    self.dimensions
                )));
            }
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
