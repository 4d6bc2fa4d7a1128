//! Vector indexes and the retrieval-augmented query pipeline

pub mod memory;
pub mod query;
pub mod search;

pub use memory::InMemoryIndex;
pub use query::{QueryPipeline, RagAnswer};
pub use search::{cosine_similarity, rank, LocalVectorStore, INDEX_FILE};
