//! CLI `query` command — top-k passage retrieval from the terminal.

use anyhow::{Context, Result};
use std::sync::Arc;

use primer::config::PrimerConfig;
use primer::embedding::EmbeddingProvider;
use primer::retriever::Retriever;

pub async fn query(config: &PrimerConfig, text: &str, k: usize) -> Result<()> {
    let provider: Arc<dyn EmbeddingProvider> = Arc::from(
        primer::embedding::create_provider(&config.embedding)
            .context("failed to create embedding provider")?,
    );

    let paths = config.index_paths();
    let retriever = Retriever::load(&paths, provider).context("failed to load index")?;

    let query_text = text.to_string();
    let passages =
        tokio::task::spawn_blocking(move || retriever.query(&query_text, k)).await??;

    if passages.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Top {} passage(s):\n", passages.len());
    for (i, passage) in passages.iter().enumerate() {
        let preview = if passage.text.chars().count() > 200 {
            let head: String = passage.text.chars().take(200).collect();
            format!("{head}...")
        } else {
            passage.text.clone()
        };

        println!("  {}. {}", i + 1, preview);
        println!("     source: {}", passage.source);
        println!();
    }

    Ok(())
}
