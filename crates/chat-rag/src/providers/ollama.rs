//! Ollama-based providers for embeddings and generation
//!
//! Wraps `OllamaClient` to implement the provider traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::OllamaClient;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &LlmConfig, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(config)?),
            dimensions,
        })
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(text).await?;
        if embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Model {} returned {} dimensions, expected {}",
                self.client.config().embed_model,
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(config)?),
        })
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn model(&self) -> &str {
        &self.client.config().generate_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ollama::tests::{spawn_stub, test_config};
    use axum::{routing::post, Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_dimension_mismatch_is_embedding_failure() {
        let router = Router::new().route(
            "/api/embeddings",
            post(|| async { Json(json!({ "embedding": [1.0, 0.0] })) }),
        );
        let embedder = OllamaEmbedder::new(&test_config(spawn_stub(router).await), 768).unwrap();

        let err = embedder.embed("text").await.unwrap_err();
        assert!(err.is_embedding_failure());
    }

    #[tokio::test]
    async fn test_shared_client() {
        let router = Router::new()
            .route(
                "/api/embeddings",
                post(|| async { Json(json!({ "embedding": [1.0, 0.0, 0.0] })) }),
            )
            .route(
                "/api/generate",
                post(|| async { Json(json!({ "response": "ok" })) }),
            );
        let client = Arc::new(OllamaClient::new(&test_config(spawn_stub(router).await)).unwrap());
        let embedder = OllamaEmbedder::from_client(Arc::clone(&client), 3);
        let llm = OllamaLlm::from_client(client);

        assert_eq!(embedder.embed("x").await.unwrap().len(), 3);
        assert_eq!(llm.generate("x").await.unwrap(), "ok");
        assert_eq!(llm.model(), "mistral");
    }
}
