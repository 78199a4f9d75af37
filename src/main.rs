mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use primer::config::PrimerConfig;

#[derive(Parser)]
#[command(name = "primer", version, about = "Semantic passage retrieval over a rebuildable vector index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the vector index from the current document corpus
    Rebuild,
    /// Show the last rebuild outcome and whether the index is stale
    Status,
    /// Retrieve the top-k passages for a query
    Query {
        text: String,
        /// Number of passages to return (defaults to the configured value)
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Manage interviews and their documents
    Interview {
        #[command(subcommand)]
        action: InterviewAction,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum InterviewAction {
    /// Create a new interview
    Create { title: String },
    /// List interviews and their documents
    List,
    /// Attach a document to an interview
    AddDoc {
        interview_id: String,
        #[arg(long)]
        title: String,
        /// Document text, given inline
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the document text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Provenance label (defaults to the title)
        #[arg(long)]
        source: Option<String>,
    },
    /// Remove a document from an interview
    RemoveDoc { interview_id: String, doc_id: String },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.primer/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = PrimerConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for scripted callers.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Rebuild => {
            cli::rebuild::rebuild(&config).await?;
        }
        Command::Status => {
            cli::status::status(&config)?;
        }
        Command::Query { text, k } => {
            let k = k.unwrap_or(config.retrieval.default_k);
            cli::query::query(&config, &text, k).await?;
        }
        Command::Interview { action } => match action {
            InterviewAction::Create { title } => {
                cli::interview::create(&config, &title)?;
            }
            InterviewAction::List => {
                cli::interview::list(&config)?;
            }
            InterviewAction::AddDoc {
                interview_id,
                title,
                text,
                file,
                source,
            } => {
                cli::interview::add_doc(&config, &interview_id, &title, text, file, source)?;
            }
            InterviewAction::RemoveDoc {
                interview_id,
                doc_id,
            } => {
                cli::interview::remove_doc(&config, &interview_id, &doc_id)?;
            }
        },
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
    }

    Ok(())
}
