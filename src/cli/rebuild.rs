//! CLI `rebuild` command — regenerate the vector index from the current corpus.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use primer::config::PrimerConfig;
use primer::rebuild::{ProgressPublisher, Rebuilder};

/// Run a full index rebuild with a live progress bar.
pub async fn rebuild(config: &PrimerConfig) -> Result<()> {
    let provider = primer::embedding::create_provider(&config.embedding)
        .context("failed to create embedding provider")?;

    let paths = config.index_paths();
    let rebuilder = Rebuilder::new(paths.clone(), config.interviews_path());
    let publisher = ProgressPublisher::new();

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/100 {msg}")
            .expect("valid template")
            .progress_chars("##-"),
    );

    let worker_publisher = publisher.clone();
    let handle =
        tokio::task::spawn_blocking(move || rebuilder.rebuild(provider.as_ref(), &worker_publisher));

    while !handle.is_finished() {
        let snapshot = publisher.snapshot();
        pb.set_position(snapshot.percent as u64);
        pb.set_message(snapshot.phase);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    pb.finish_and_clear();

    let status = handle.await?.context("index rebuild failed")?;

    println!(
        "Rebuild complete: {} documents ({} base, {} interview).",
        status.total_documents, status.original_docs, status.interview_docs
    );
    println!("Index saved to {}", paths.vector_index.display());
    Ok(())
}
