//! Process-wide handle wiring one index to both pipelines

use std::sync::Arc;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::embeddings::HashingEmbedder;
use crate::error::Result;
use crate::generation::{GenerationClient, OllamaClient};
use crate::ingestion::{IngestPipeline, TextChunker};
use crate::providers::{EmbeddingProvider, LlmProvider, OllamaEmbedder, OllamaLlm, VectorIndex};
use crate::retrieval::{LocalVectorStore, QueryPipeline};

/// Shared application state
///
/// Built once at startup. Clones share the same index, so every ingestion and
/// query in the process sees one logical store.
#[derive(Clone)]
pub struct RagState {
    inner: Arc<RagStateInner>,
}

struct RagStateInner {
    /// Configuration
    config: RagConfig,
    /// Embedding provider (Ollama or hashing)
    embedder: Arc<dyn EmbeddingProvider>,
    /// LLM provider
    llm: Arc<dyn LlmProvider>,
    /// The single vector index
    index: Arc<dyn VectorIndex>,
    ingest: IngestPipeline,
    query: QueryPipeline,
}

/// Reachability of the external services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHealth {
    pub embedder: bool,
    pub llm: bool,
}

impl RagState {
    /// Build providers, open the persistent index and wire the pipelines
    pub fn from_config(config: RagConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Initializing RAG state (embeddings: {:?}, model: {})",
            config.embeddings.backend,
            config.llm.generate_model
        );

        let ollama = Arc::new(OllamaClient::new(&config.llm)?);

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::from_client(
                Arc::clone(&ollama),
                config.embeddings.dimensions,
            )),
            EmbeddingBackend::Hashing => {
                Arc::new(HashingEmbedder::new(config.embeddings.dimensions)?)
            }
        };
        let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::from_client(ollama));

        let index: Arc<dyn VectorIndex> = Arc::new(
            LocalVectorStore::open(&config.vector_db.storage_path, Arc::clone(&embedder))?
                .with_embed_timeout(config.embeddings.timeout()),
        );

        Self::with_providers(config, embedder, llm, index)
    }

    /// Wire pipelines around caller-supplied providers and index
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = TextChunker::from_config(&config.chunking)?;
        let ingest = IngestPipeline::new(chunker, Arc::clone(&index))
            .with_staging_dir(config.uploads.staging_dir.clone());
        let query = QueryPipeline::new(
            Arc::clone(&index),
            GenerationClient::new(Arc::clone(&llm), config.llm.timeout()),
            config.retrieval.top_k,
        );

        tracing::info!(
            "RAG state ready (index: {}, embedder: {}, llm: {})",
            index.name(),
            embedder.name(),
            llm.name()
        );

        Ok(Self {
            inner: Arc::new(RagStateInner {
                config,
                embedder,
                llm,
                index,
                ingest,
                query,
            }),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.inner.index
    }

    pub fn ingest(&self) -> &IngestPipeline {
        &self.inner.ingest
    }

    pub fn query(&self) -> &QueryPipeline {
        &self.inner.query
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// Probe both external services
    pub async fn health(&self) -> ServiceHealth {
        let (embedder, llm) = tokio::join!(
            self.inner.embedder.health_check(),
            self.inner.llm.health_check()
        );
        ServiceHealth {
            embedder: embedder.unwrap_or(false),
            llm: llm.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;

    fn hashing_config(dir: &std::path::Path) -> RagConfig {
        let mut config = RagConfig::default();
        config.embeddings.backend = EmbeddingBackend::Hashing;
        config.embeddings.dimensions = 128;
        config.vector_db.storage_path = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_clones_share_one_index() {
        let dir = tempfile::tempdir().unwrap();
        let state = RagState::from_config(hashing_config(dir.path())).unwrap();
        let clone = state.clone();

        state
            .ingest()
            .ingest_bytes("sky.txt", b"The sky is blue.".to_vec())
            .await
            .unwrap();

        assert_eq!(clone.index().len().await.unwrap(), 1);
        assert_eq!(clone.embedder().name(), "hashing");
        assert_eq!(clone.llm().model(), "mistral");
    }

    #[tokio::test]
    async fn test_index_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let state = RagState::from_config(hashing_config(dir.path())).unwrap();
            state
                .ingest()
                .ingest_bytes("a.txt", b"persisted text".to_vec())
                .await
                .unwrap();
        }

        let state = RagState::from_config(hashing_config(dir.path())).unwrap();
        assert_eq!(state.index().len().await.unwrap(), 1);
    }

    #[test]
    fn test_injected_providers_still_validate_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = hashing_config(dir.path());
        config.retrieval.top_k = 0;

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(128).unwrap());
        let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::new(&config.llm).unwrap());
        let index: Arc<dyn VectorIndex> =
            Arc::new(crate::retrieval::InMemoryIndex::new(Arc::clone(&embedder)));

        let err = RagState::with_providers(config, embedder, llm, index).err().unwrap();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = hashing_config(dir.path());
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(RagState::from_config(config).is_err());
    }
}
