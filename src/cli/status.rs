//! CLI `status` command — last rebuild outcome plus a staleness check.

use anyhow::Result;

use primer::config::PrimerConfig;
use primer::interviews::InterviewStore;
use primer::rebuild::{status_report, RebuildOutcome};

pub fn status(config: &PrimerConfig) -> Result<()> {
    let paths = config.index_paths();
    let interviews_path = config.interviews_path();
    let report = status_report(&paths, &interviews_path);

    match &report.last_status {
        Some(last) => {
            println!("Last rebuild: {} ({})", last.last_rebuild, last.status);
            if let Some(error) = &last.error {
                println!("  error: {error}");
            }
            if last.status == RebuildOutcome::Completed {
                println!(
                    "  {} documents ({} base, {} interview)",
                    last.total_documents, last.original_docs, last.interview_docs
                );
                println!("  rebuild id: {}", last.rebuild_id);
            }
        }
        None => println!("No rebuild has been recorded."),
    }

    println!(
        "Index present: {}",
        if report.index_exists { "yes" } else { "no" }
    );

    let store = InterviewStore::load(&interviews_path)?;
    println!(
        "Document store: {} interview(s), {} document(s)",
        store.len(),
        store.document_count()
    );

    if report.stale {
        println!("The document store has changed since the last rebuild. Run `primer rebuild`.");
    }

    Ok(())
}
