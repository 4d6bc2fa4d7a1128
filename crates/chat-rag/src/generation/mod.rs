//! Answer generation: Ollama client, prompt assembly and the degrade-gracefully boundary

pub mod client;
pub mod ollama;
pub mod prompt;

pub use client::{Completion, GenerationClient, FAILURE_PREFIX};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
