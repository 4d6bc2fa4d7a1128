//! chat-rag: retrieval-augmented question answering over local documents
//!
//! Documents are parsed into page text, split into overlapping character
//! windows, embedded and stored in a persistent vector index. Questions are
//! answered by retrieving the closest chunks and asking a local Ollama model
//! to answer from them.
//!
//! ```no_run
//! use chat_rag::{RagConfig, RagState};
//!
//! # async fn run() -> chat_rag::Result<()> {
//! let state = RagState::from_config(RagConfig::default())?;
//! state.ingest().ingest_file("notes.txt".as_ref()).await?;
//! let answer = state.query().answer("What do my notes say?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod state;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::IngestPipeline;
pub use retrieval::{QueryPipeline, RagAnswer};
pub use state::RagState;
pub use types::{ChatMessage, Chunk, ChunkSource, Document, FileType, Role};
