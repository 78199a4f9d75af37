//! CLI `interview` commands — manage the mutable half of the corpus.
//!
//! Edits here only change the document store; they become searchable at the
//! next `primer rebuild`.

use anyhow::{Context, Result};
use std::path::PathBuf;

use primer::config::PrimerConfig;
use primer::interviews::InterviewStore;

pub fn create(config: &PrimerConfig, title: &str) -> Result<()> {
    let mut store = InterviewStore::load(config.interviews_path())?;
    let id = store.create_interview(title);
    store.save()?;
    println!("Created interview '{title}' with id {id}");
    Ok(())
}

pub fn list(config: &PrimerConfig) -> Result<()> {
    let store = InterviewStore::load(config.interviews_path())?;
    if store.is_empty() {
        println!("No interviews yet. Create one with `primer interview create <title>`.");
        return Ok(());
    }

    for (id, interview) in store.list() {
        println!(
            "{}  {} ({} document(s))",
            id,
            interview.title,
            interview.documents.len()
        );
        for doc in &interview.documents {
            println!("    {}  {} [{}]", doc.id, doc.title, doc.source_label());
        }
    }
    Ok(())
}

pub fn add_doc(
    config: &PrimerConfig,
    interview_id: &str,
    title: &str,
    text: Option<String>,
    file: Option<PathBuf>,
    source: Option<String>,
) -> Result<()> {
    let content = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("provide document content via --text or --file"),
    };

    let mut store = InterviewStore::load(config.interviews_path())?;
    let doc_id = store.add_document(interview_id, title, &content, source.as_deref())?;
    store.save()?;

    let interview_title = store
        .get(interview_id)
        .map(|i| i.title.clone())
        .unwrap_or_default();
    println!("Added document {doc_id} to interview '{interview_title}'.");
    println!("Run `primer rebuild` to make it searchable.");
    Ok(())
}

pub fn remove_doc(config: &PrimerConfig, interview_id: &str, doc_id: &str) -> Result<()> {
    let mut store = InterviewStore::load(config.interviews_path())?;
    if !store.remove_document(interview_id, doc_id)? {
        anyhow::bail!("no document {doc_id} in interview {interview_id}");
    }
    store.save()?;
    println!("Removed document {doc_id}.");
    println!("Run `primer rebuild` to drop it from the index.");
    Ok(())
}
