//! Provider abstractions for embeddings, generation and vector indexes
//!
//! Pipelines only see these traits, so Ollama, the offline embedder and test
//! doubles are interchangeable.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use vector_store::{IndexEntry, SearchResult, VectorIndex};
