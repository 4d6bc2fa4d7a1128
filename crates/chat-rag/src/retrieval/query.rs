//! Retrieval-augmented answering

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::generation::{GenerationClient, PromptBuilder};
use crate::providers::{SearchResult, VectorIndex};

/// Answer together with what it was grounded on
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// Model completion, or the inline error text when generation failed
    pub answer: String,
    /// Retrieved chunks in ranked order
    pub context: Vec<SearchResult>,
    /// Prompt sent to the model
    pub prompt: String,
}

impl RagAnswer {
    /// Distinct citations of the retrieved chunks, in rank order
    pub fn sources(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.context
            .iter()
            .map(|result| result.chunk.source.format_citation())
            .filter(|citation| seen.insert(citation.clone()))
            .collect()
    }
}

/// Stateless orchestrator: search, assemble prompt, generate
#[derive(Clone)]
pub struct QueryPipeline {
    index: Arc<dyn VectorIndex>,
    generator: GenerationClient,
    top_k: usize,
}

impl QueryPipeline {
    pub fn new(index: Arc<dyn VectorIndex>, generator: GenerationClient, top_k: usize) -> Self {
        Self {
            index,
            generator,
            top_k,
        }
    }

    /// Answer `query` from the top-k retrieved chunks.
    ///
    /// Embedding failures during search are returned as errors. Generation
    /// failures are not; they come back as the answer text.
    pub async fn answer(&self, query: &str) -> Result<String> {
        Ok(self.answer_with_sources(query).await?.answer)
    }

    pub async fn answer_with_sources(&self, query: &str) -> Result<RagAnswer> {
        let context = self.index.search(query, self.top_k).await?;
        tracing::info!(
            "Retrieved {} chunks from {} index for query",
            context.len(),
            self.index.name()
        );

        let context_text = PromptBuilder::build_context(&context);
        let prompt = PromptBuilder::build_rag_prompt(query, &context_text);
        tracing::debug!("Prompt is {} characters", prompt.chars().count());

        let answer = match self.generator.generate(&prompt).await {
            Ok(answer) => answer,
            Err(never) => match never {},
        };

        Ok(RagAnswer {
            answer,
            context,
            prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::error::Error;
    use crate::providers::{EmbeddingProvider, LlmProvider};
    use crate::retrieval::InMemoryIndex;
    use crate::types::Chunk;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    /// Refuses any text mentioning "fail"
    struct PickyEmbedder;

    #[async_trait]
    impl EmbeddingProvider for PickyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("fail") {
                return Err(Error::embedding("down"));
            }
            Ok(vec![1.0; 8])
        }

        fn dimensions(&self) -> usize {
            8
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "picky"
        }
    }

    fn pipeline(index: Arc<dyn VectorIndex>) -> QueryPipeline {
        QueryPipeline::new(
            index,
            GenerationClient::new(Arc::new(EchoLlm), Duration::from_secs(1)),
            3,
        )
    }

    #[tokio::test]
    async fn test_context_is_capped_at_top_k() {
        let index = Arc::new(InMemoryIndex::new(Arc::new(HashingEmbedder::new(128).unwrap())));
        let chunks: Vec<Chunk> = (0..5)
            .map(|i| Chunk::from_text("n.txt", format!("note number {}", i)))
            .collect();
        index.add(&chunks).await.unwrap();

        let result = pipeline(index).answer_with_sources("note").await.unwrap();
        assert_eq!(result.context.len(), 3);
        assert_eq!(result.answer, result.prompt);
        for pair in result.context.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_sources_are_distinct_in_rank_order() {
        let result = |filename: &str| SearchResult {
            chunk: Chunk::from_text(filename, "text"),
            similarity: 0.5,
        };
        let answer = RagAnswer {
            answer: String::new(),
            context: vec![result("a.txt"), result("b.txt"), result("a.txt"), result("c.md")],
            prompt: String::new(),
        };
        assert_eq!(answer.sources(), vec!["a.txt", "b.txt", "c.md"]);
    }

    #[tokio::test]
    async fn test_empty_index_still_answers() {
        let index = Arc::new(InMemoryIndex::new(Arc::new(HashingEmbedder::new(16).unwrap())));
        let answer = pipeline(index).answer("Anyone there?").await.unwrap();
        assert!(answer.contains("Use the context below"));
        assert!(answer.contains("Anyone there?"));
    }

    #[tokio::test]
    async fn test_search_embedding_failure_propagates() {
        let index = Arc::new(InMemoryIndex::new(Arc::new(PickyEmbedder)));
        index.add(&[Chunk::from_text("a.txt", "text")]).await.unwrap();

        let err = pipeline(index).answer("will this fail?").await.unwrap_err();
        assert!(err.is_embedding_failure());
    }
}
