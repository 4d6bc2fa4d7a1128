//! Ingestion pipeline orchestration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::VectorIndex;
use crate::types::{Chunk, Document};

use super::chunker::TextChunker;
use super::parser::{FileParser, ParsedDocument};
use super::upload::StagedUpload;

/// Main ingestion pipeline: parse, chunk, embed, index, persist
#[derive(Clone)]
pub struct IngestPipeline {
    /// Text chunker
    chunker: TextChunker,
    /// Shared index every ingestion writes to
    index: Arc<dyn VectorIndex>,
    /// Where uploads are staged (OS temp dir when unset)
    staging_dir: Option<PathBuf>,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(chunker: TextChunker, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            chunker,
            index,
            staging_dir: None,
        }
    }

    pub fn with_staging_dir(mut self, staging_dir: Option<PathBuf>) -> Self {
        self.staging_dir = staging_dir;
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Parse and chunk without touching the index
    pub fn prepare(&self, filename: &str, data: &[u8]) -> Result<(Document, Vec<Chunk>)> {
        let parsed = FileParser::parse(filename, data)?;
        Ok(self.create_chunks(filename, &parsed, data.len() as u64))
    }

    fn create_chunks(
        &self,
        filename: &str,
        parsed: &ParsedDocument,
        file_size: u64,
    ) -> (Document, Vec<Chunk>) {
        let doc = Document::new(
            filename.to_string(),
            parsed.file_type,
            parsed.content_hash.clone(),
            parsed.total_pages(),
            file_size,
        );
        let chunks = self.chunker.chunk_document(&doc, parsed);
        (doc, chunks)
    }

    /// Ingest a file from disk. Returns the number of chunks indexed.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::file_parse(path.display().to_string(), "Path has no file name"))?;
        let data = tokio::fs::read(path).await?;
        self.ingest_bytes(&filename, data).await
    }

    /// Ingest in-memory file contents; `filename` decides the format
    pub async fn ingest_bytes(&self, filename: &str, data: Vec<u8>) -> Result<usize> {
        let file_size = data.len() as u64;
        let name = filename.to_string();
        let parsed = tokio::task::spawn_blocking(move || FileParser::parse(&name, &data))
            .await
            .map_err(|e| Error::internal(format!("Parse task failed: {}", e)))??;

        self.index_parsed(filename, &parsed, file_size).await
    }

    /// Ingest uploaded bytes via a uniquely named staging file.
    ///
    /// The staged copy is removed when this returns, on success or failure.
    pub async fn ingest_upload(&self, filename: &str, data: Vec<u8>) -> Result<usize> {
        let file_size = data.len() as u64;
        let name = filename.to_string();
        let staging_dir = self.staging_dir.clone();

        let (_staged, parsed) = tokio::task::spawn_blocking(move || {
            let staged = StagedUpload::stage(&name, &data, staging_dir.as_deref())?;
            let parsed = FileParser::parse_path(staged.path(), staged.filename())?;
            Ok::<_, Error>((staged, parsed))
        })
        .await
        .map_err(|e| Error::internal(format!("Parse task failed: {}", e)))??;

        self.index_parsed(filename, &parsed, file_size).await
    }

    async fn index_parsed(
        &self,
        filename: &str,
        parsed: &ParsedDocument,
        file_size: u64,
    ) -> Result<usize> {
        let (doc, chunks) = self.create_chunks(filename, parsed, file_size);

        if chunks.is_empty() {
            tracing::info!("{} has no extractable text, nothing indexed", filename);
            return Ok(0);
        }

        tracing::info!(
            "Indexing {} chunks from {} ({} pages, {})",
            chunks.len(),
            doc.filename,
            doc.total_pages,
            doc.file_type.display_name()
        );

        let added = self.index.add(&chunks).await?;
        self.index.persist().await?;

        tracing::info!("Ingested {}: {} chunks", doc.filename, added);
        Ok(added)
    }
}
