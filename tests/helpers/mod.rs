#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};

use primer::embedding::EmbeddingProvider;
use primer::error::{PrimerError, Result};
use primer::index::IndexMetadata;

pub const TEST_DIM: usize = 16;

/// Deterministic test provider: each distinct text gets its own spike
/// dimension, assigned in first-seen order, so distinct texts embed to
/// orthogonal vectors and repeated texts embed identically.
///
/// Slot assignment lives in the instance — share one provider between the
/// rebuild and the retriever so build-time and query-time vectors agree.
pub struct SpikeProvider {
    slots: Mutex<HashMap<String, usize>>,
    model: String,
}

impl SpikeProvider {
    pub fn new() -> Self {
        Self::with_model("spike-test")
    }

    pub fn with_model(model: &str) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            model: model.to_string(),
        }
    }
}

impl EmbeddingProvider for SpikeProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(PrimerError::EmptyText);
        }
        let mut slots = self.slots.lock().unwrap();
        let next = slots.len();
        let slot = *slots.entry(text.to_string()).or_insert(next);
        assert!(
            slot < TEST_DIM,
            "test corpus has more than {TEST_DIM} distinct texts"
        );

        let mut v = vec![0.0f32; TEST_DIM];
        v[slot] = 1.0;
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// A provider whose every call fails, for rebuild-failure scenarios.
pub struct FailingProvider;

impl EmbeddingProvider for FailingProvider {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(PrimerError::EmbeddingFailed("provider offline".into()))
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }

    fn model_id(&self) -> &str {
        "spike-test"
    }
}

/// A provider that blocks inside its first embedding call until released,
/// for exercising the in-flight rebuild guard.
pub struct GateProvider {
    inner: SpikeProvider,
    gate: Arc<(Mutex<bool>, Condvar)>,
}

impl GateProvider {
    /// Returns the provider and a handle; call [`open_gate`] with the handle
    /// to let blocked embedding calls proceed.
    pub fn new() -> (Self, Arc<(Mutex<bool>, Condvar)>) {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        (
            Self {
                inner: SpikeProvider::new(),
                gate: Arc::clone(&gate),
            },
            gate,
        )
    }
}

pub fn open_gate(gate: &Arc<(Mutex<bool>, Condvar)>) {
    let (lock, cvar) = &**gate;
    *lock.lock().unwrap() = true;
    cvar.notify_all();
}

impl EmbeddingProvider for GateProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let (lock, cvar) = &*self.gate;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
        drop(open);
        self.inner.embed(text)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

/// Seed a base-corpus metadata file from `(id, text, source)` entries.
pub fn write_base_metadata(path: &Path, entries: &[(&str, &str, &str)], model: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let metadata = IndexMetadata {
        ids: entries.iter().map(|(id, _, _)| id.to_string()).collect(),
        texts: entries.iter().map(|(_, text, _)| text.to_string()).collect(),
        sources: entries
            .iter()
            .map(|(_, _, source)| source.to_string())
            .collect(),
        last_rebuilt: "2026-08-04T12:00:00+00:00".into(),
        total_documents: entries.len(),
        embedding_model: model.to_string(),
    };
    metadata.save(path).unwrap();
}
