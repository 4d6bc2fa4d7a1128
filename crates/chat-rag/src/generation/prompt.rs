//! Prompt templates for RAG generation

use crate::providers::SearchResult;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts in ranked order, separated by a blank line
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|result| result.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Wrap context and question in the instructional template.
    ///
    /// An empty context still produces the full wrapper.
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            "\nUse the context below to answer the question.\n\nContext:\n{context}\n\nQuestion:\n{question}\n"
        )
    }
}
