//! Flat (exhaustive) vector index over fixed-dimension embeddings.
//!
//! Search scans every stored vector and ranks by squared Euclidean distance,
//! nearest first. Callers relying on cosine similarity must pre-normalize
//! their vectors; both built-in embedding providers do. The index is
//! immutable once built — mutation is a rebuild plus a handle swap.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PrimerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index from an ordered list of vectors. Position in the list
    /// becomes the position reported by [`search`](Self::search).
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = vectors.first().ok_or(PrimerError::EmptyCorpus)?.len();
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(PrimerError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }
        Ok(Self { dimension, vectors })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Return up to `min(k, len)` `(position, distance)` pairs sorted
    /// ascending by squared L2 distance.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 {
            return Err(PrimerError::InvalidK(k));
        }
        if query.len() != self.dimension {
            return Err(PrimerError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(query, vector)))
            .collect();
        // total_cmp keeps the sort well-defined even if a distance is NaN
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        super::write_json_atomic(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let index: Self = super::read_json(path)?;
        for vector in &index.vectors {
            if vector.len() != index.dimension {
                return Err(PrimerError::corrupt(
                    path,
                    format!(
                        "stored vector has {} dimensions, index records {}",
                        vector.len(),
                        index.dimension
                    ),
                ));
            }
        }
        Ok(index)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
