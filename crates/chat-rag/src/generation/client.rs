//! Generation boundary that never fails
//!
//! Transport errors, timeouts and malformed responses are turned into a
//! visible answer string so a chat exchange always completes.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{bounded, GENERATION_OPERATION};
use crate::providers::LlmProvider;

/// Outcome of a generation call. The error type is uninhabited.
pub type Completion = Result<String, Infallible>;

/// Prefix of every degraded answer
pub const FAILURE_PREFIX: &str = "Error communicating with";

/// Deadline-bounded wrapper around an [`LlmProvider`]
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Complete `prompt`, reporting failures inline as
    /// `"Error communicating with <service>: <detail>"`
    pub async fn generate(&self, prompt: &str) -> Completion {
        match bounded(GENERATION_OPERATION, self.timeout, self.provider.generate(prompt)).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(
                    "Generation via {} ({}) failed, answering with error text: {}",
                    self.provider.name(),
                    self.provider.model(),
                    e
                );
                Ok(format!("{} {}: {}", FAILURE_PREFIX, self.provider.name(), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;

    enum Behaviour {
        Echo,
        Fail,
        Hang,
    }

    struct FakeLlm(Behaviour);

    #[async_trait]
    impl LlmProvider for FakeLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            match self.0 {
                Behaviour::Echo => Ok(prompt.to_string()),
                Behaviour::Fail => Err(Error::llm("connection refused")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".into())
                }
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "Ollama"
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    fn client(behaviour: Behaviour) -> GenerationClient {
        GenerationClient::new(Arc::new(FakeLlm(behaviour)), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let answer = client(Behaviour::Echo).generate("hello").await.unwrap();
        assert_eq!(answer, "hello");
    }

    #[tokio::test]
    async fn test_failure_becomes_answer_text() {
        let answer = client(Behaviour::Fail).generate("hello").await.unwrap();
        assert!(answer.starts_with("Error communicating with Ollama: "));
        assert!(answer.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_answer_text() {
        let answer = client(Behaviour::Hang).generate("hello").await.unwrap();
        assert!(answer.starts_with(FAILURE_PREFIX));
        assert!(answer.contains("timed out"));
    }
}
