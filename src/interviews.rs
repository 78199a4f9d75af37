//! The interview document store — the mutable half of the corpus.
//!
//! A flat JSON file mapping interview id to its title and attached
//! documents. This file is the source of truth the vector index is derived
//! from: edits here take effect at the next rebuild. Interviews are kept in
//! a `BTreeMap` so iteration order (and therefore index position order) is
//! stable for a fixed snapshot of the file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::error::{PrimerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Provenance label, e.g. an upload filename. Falls back to the title
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl InterviewDocument {
    /// The label used when this document is cited as a retrieval source.
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub title: String,
    #[serde(default)]
    pub documents: Vec<InterviewDocument>,
}

#[derive(Debug)]
pub struct InterviewStore {
    path: PathBuf,
    interviews: BTreeMap<String, Interview>,
}

impl InterviewStore {
    /// Load the store from disk. A missing file is an empty store, not an
    /// error; a present but undecodable file is `Corrupt`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let interviews = if path.exists() {
            crate::index::read_json(&path)?
        } else {
            debug!(path = %path.display(), "no interview store on disk, starting empty");
            BTreeMap::new()
        };
        Ok(Self { path, interviews })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interviews in sorted-id order.
    pub fn list(&self) -> impl Iterator<Item = (&String, &Interview)> {
        self.interviews.iter()
    }

    pub fn get(&self, interview_id: &str) -> Option<&Interview> {
        self.interviews.get(interview_id)
    }

    pub fn len(&self) -> usize {
        self.interviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interviews.is_empty()
    }

    /// Total documents across all interviews.
    pub fn document_count(&self) -> usize {
        self.interviews.values().map(|i| i.documents.len()).sum()
    }

    /// Create a new, empty interview and return its id.
    pub fn create_interview(&mut self, title: &str) -> String {
        let id = Uuid::now_v7().to_string();
        self.interviews.insert(
            id.clone(),
            Interview {
                title: title.to_string(),
                documents: Vec::new(),
            },
        );
        id
    }

    /// Attach a document to an interview and return the new document id.
    pub fn add_document(
        &mut self,
        interview_id: &str,
        title: &str,
        content: &str,
        source: Option<&str>,
    ) -> Result<String> {
        let interview = self
            .interviews
            .get_mut(interview_id)
            .ok_or_else(|| PrimerError::InterviewNotFound(interview_id.to_string()))?;

        let id = Uuid::now_v7().to_string();
        interview.documents.push(InterviewDocument {
            id: id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            source: source.map(str::to_string),
        });
        Ok(id)
    }

    /// Detach a document. Returns `false` if the document was not present.
    pub fn remove_document(&mut self, interview_id: &str, doc_id: &str) -> Result<bool> {
        let interview = self
            .interviews
            .get_mut(interview_id)
            .ok_or_else(|| PrimerError::InterviewNotFound(interview_id.to_string()))?;

        let before = interview.documents.len();
        interview.documents.retain(|doc| doc.id != doc_id);
        Ok(interview.documents.len() < before)
    }

    /// Persist the store back to its file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PrimerError::persistence(parent, e))?;
        }
        crate::index::write_json_atomic(&self.path, &self.interviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty_store() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = InterviewStore::load(tmp.path().join("interviews.json")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("interviews.json");
        std::fs::write(&path, "][").unwrap();
        assert!(matches!(
            InterviewStore::load(path),
            Err(PrimerError::Corrupt { .. })
        ));
    }

    #[test]
    fn add_and_remove_documents_roundtrip_through_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("interviews.json");

        let mut store = InterviewStore::load(&path).unwrap();
        let interview_id = store.create_interview("Acme Systems");
        let doc_id = store
            .add_document(&interview_id, "Resume", "Ten years of Rust.", Some("resume.pdf"))
            .unwrap();
        store.save().unwrap();

        let mut reloaded = InterviewStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.document_count(), 1);
        let interview = reloaded.get(&interview_id).unwrap();
        assert_eq!(interview.title, "Acme Systems");
        assert_eq!(interview.documents[0].source_label(), "resume.pdf");

        assert!(reloaded.remove_document(&interview_id, &doc_id).unwrap());
        assert!(!reloaded.remove_document(&interview_id, &doc_id).unwrap());
        assert_eq!(reloaded.document_count(), 0);
    }

    #[test]
    fn add_to_unknown_interview_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut store = InterviewStore::load(tmp.path().join("interviews.json")).unwrap();
        assert!(matches!(
            store.add_document("nope", "Doc", "text", None),
            Err(PrimerError::InterviewNotFound(_))
        ));
    }

    #[test]
    fn source_label_falls_back_to_title() {
        let doc = InterviewDocument {
            id: "x".into(),
            title: "Job Description".into(),
            content: "…".into(),
            source: None,
        };
        assert_eq!(doc.source_label(), "Job Description");
    }

    #[test]
    fn list_iterates_in_sorted_id_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("interviews.json");
        std::fs::write(
            &path,
            r#"{
                "b": {"title": "Second", "documents": []},
                "a": {"title": "First", "documents": []}
            }"#,
        )
        .unwrap();

        let store = InterviewStore::load(&path).unwrap();
        let titles: Vec<&str> = store.list().map(|(_, i)| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }
}
