//! chat-rag command line
//!
//! Run with: cargo run -p chat-rag -- ask "What does the report conclude?"

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_rag::{ChatMessage, RagConfig, RagState};

#[derive(Parser)]
#[command(name = "chat-rag", version, about = "Ask questions about your documents")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index one or more documents (pdf, txt, md)
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Answer a question from the indexed documents
    Ask {
        question: String,
        /// Print the user/assistant exchange as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show index size and service reachability
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RagConfig::load(path)?,
        None => RagConfig::default(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings: {:?} ({} dims)", config.embeddings.backend, config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Index: {}", config.vector_db.storage_path.display());

    let state = RagState::from_config(config)?;

    match cli.command {
        Command::Ingest { files } => {
            let mut failed = 0usize;
            for path in &files {
                match state.ingest().ingest_file(path).await {
                    Ok(count) => println!("{}: {} chunks", path.display(), count),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {}", path.display(), e);
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{} of {} files failed to ingest", failed, files.len());
            }
        }
        Command::Ask { question, json } => {
            let result = state.query().answer_with_sources(&question).await?;
            if json {
                let exchange = ChatMessage::exchange(question, result.answer);
                println!("{}", serde_json::to_string_pretty(&exchange)?);
            } else {
                println!("{}", result.answer);
                let sources = result.sources();
                if !sources.is_empty() {
                    println!("\nSources:");
                    for source in sources {
                        println!("  - {}", source);
                    }
                }
            }
        }
        Command::Stats => {
            let health = state.health().await;
            println!("Index:    {}", state.config().vector_db.storage_path.display());
            println!("Entries:  {}", state.index().len().await?);
            println!(
                "Embedder: {} ({})",
                state.embedder().name(),
                if health.embedder { "reachable" } else { "unreachable" }
            );
            println!(
                "LLM:      {} {} ({})",
                state.llm().name(),
                state.llm().model(),
                if health.llm { "reachable" } else { "unreachable" }
            );
        }
    }

    Ok(())
}
