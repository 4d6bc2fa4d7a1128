//! Ollama HTTP client for embeddings and generation with retry logic

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Failure of one request attempt
enum Attempt {
    /// Connection or I/O level failure; worth another try
    Transport(Error),
    /// The server answered, but not usefully
    Fatal(Error),
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Retry a request with exponential backoff.
    ///
    /// Only transport failures are retried. Status and decode errors return at once.
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, Attempt>>,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(Attempt::Transport(e)) if attempt < max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(Attempt::Transport(e)) | Err(Attempt::Fatal(e)) => return Err(e),
            }
        }
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding using Ollama with retry
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let endpoint = format!("{}/api/embeddings", self.config.base_url);
        let url = endpoint.as_str();

        self.retry_request(move || async move {
            let request = EmbedRequest {
                model: &self.config.embed_model,
                prompt: text,
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    Attempt::Transport(Error::embedding(format!("Embedding request failed: {}", e)))
                })?;

            if !response.status().is_success() {
                return Err(Attempt::Fatal(Error::embedding(format!(
                    "Embedding failed: HTTP {}",
                    response.status()
                ))));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Attempt::Fatal(Error::embedding(format!(
                    "Failed to parse embedding response: {}",
                    e
                )))
            })?;

            Ok(embed_response.embedding)
        })
        .await
    }

    /// Complete a prompt in a single non-streaming response
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let endpoint = format!("{}/api/generate", self.config.base_url);
        let url = endpoint.as_str();

        tracing::info!("Generating answer with model: {}", self.config.generate_model);

        self.retry_request(move || async move {
            let request = GenerateRequest {
                model: &self.config.generate_model,
                prompt,
                stream: false,
                options: self
                    .config
                    .temperature
                    .map(|temperature| GenerateOptions { temperature }),
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    Attempt::Transport(Error::llm(format!("Generation request failed: {}", e)))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Attempt::Fatal(Error::llm(format!(
                    "Generation failed: HTTP {} - {}",
                    status, body
                ))));
            }

            let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                Attempt::Fatal(Error::llm(format!(
                    "Failed to parse generation response: {}",
                    e
                )))
            })?;

            Ok(generate_response.response)
        })
        .await
    }
}
