//! Document ingestion pipeline with multi-format parsing

mod chunker;
mod parser;
mod processor;
mod upload;

pub use chunker::{ChunkSpans, TextChunker, TextSpan};
pub use parser::{FileParser, PageContent, ParsedDocument};
pub use processor::IngestPipeline;
pub use upload::StagedUpload;
