//! Error types for the RAG pipeline

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// An external call did not finish within its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// Ollama/LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Operation label used for embedding timeouts
pub const EMBEDDING_OPERATION: &str = "embedding";

/// Operation label used for generation timeouts
pub const GENERATION_OPERATION: &str = "generation";

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The document could not be turned into text
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::FileParse { .. } | Self::UnsupportedFileType(_))
    }

    /// The embedder failed or did not answer in time
    pub fn is_embedding_failure(&self) -> bool {
        match self {
            Self::Embedding(_) => true,
            Self::Timeout { operation, .. } => *operation == EMBEDDING_OPERATION,
            _ => false,
        }
    }

    /// Deadline expiry of any external call
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Run `fut` with a deadline, turning expiry into [`Error::Timeout`].
///
/// Dropping the inner future on expiry cancels the in-flight request.
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation,
            after: limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded("embedding", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_reports_timeout() {
        let err = bounded(EMBEDDING_OPERATION, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert!(err.is_embedding_failure());
        assert!(!err.is_parse_error());
    }

    #[test]
    fn test_error_taxonomy() {
        assert!(Error::file_parse("a.pdf", "bad xref").is_parse_error());
        assert!(Error::UnsupportedFileType("exe".into()).is_parse_error());
        assert!(Error::embedding("connection refused").is_embedding_failure());
        assert!(!Error::llm("boom").is_embedding_failure());

        let generation_timeout = Error::Timeout {
            operation: GENERATION_OPERATION,
            after: Duration::from_secs(1),
        };
        assert!(!generation_timeout.is_embedding_failure());
    }
}
