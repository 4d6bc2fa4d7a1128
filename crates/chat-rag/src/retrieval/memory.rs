//! Process-local index for tests and throwaway sessions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::EmbeddingConfig;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, IndexEntry, SearchResult, VectorIndex};
use crate::types::Chunk;

use super::search::{embed_entries, embed_query, rank};

/// Same contract as `LocalVectorStore`, with nothing written to disk.
///
/// `persist` only counts how often it was called.
pub struct InMemoryIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    embed_timeout: Duration,
    entries: RwLock<Vec<IndexEntry>>,
    persist_calls: AtomicUsize,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            embed_timeout: EmbeddingConfig::default().timeout(),
            entries: RwLock::new(Vec::new()),
            persist_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Number of `persist` calls so far
    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let new_entries = embed_entries(self.embedder.as_ref(), self.embed_timeout, chunks).await?;
        let added = new_entries.len();
        self.entries.write().extend(new_entries);
        Ok(added)
    }

    async fn persist(&self) -> Result<()> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 || self.entries.read().is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = embed_query(self.embedder.as_ref(), self.embed_timeout, query).await?;
        let entries = self.entries.read();
        Ok(rank(&entries, &query_embedding, top_k))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
