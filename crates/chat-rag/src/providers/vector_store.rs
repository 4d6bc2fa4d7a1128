//! Vector index trait for storing and searching chunks

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Chunk;

/// Search result from a vector index
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// A chunk together with its embedding, as held by an index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Nearest-neighbour index over chunk embeddings
///
/// Implementations:
/// - `LocalVectorStore`: JSON snapshot in a persistence directory
/// - `InMemoryIndex`: process-local, for tests and throwaway sessions
///
/// Entries are append-only. Adding the same text twice stores it twice.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and insert chunks. Returns how many were added.
    ///
    /// An empty slice is a no-op. If embedding fails nothing from the batch is inserted.
    async fn add(&self, chunks: &[Chunk]) -> Result<usize>;

    /// Flush entries to durable storage. Must follow every `add` batch.
    async fn persist(&self) -> Result<()>;

    /// Embed `query` and return up to `top_k` entries, most similar first
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;

    /// Get total number of entries
    async fn len(&self) -> Result<usize>;

    /// Check if index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get index name for logging
    fn name(&self) -> &str;
}
