//! Character-window chunking with page and position tracking

use std::iter::FusedIterator;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Document};

use super::parser::ParsedDocument;

/// Splits text into fixed-size character windows that overlap their predecessor
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters repeated from the end of the previous chunk
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Requires `0 <= overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be greater than 0".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily walk `text` in windows. Clone the iterator (or call again) to restart.
    pub fn spans<'a>(&self, text: &'a str) -> ChunkSpans<'a> {
        ChunkSpans {
            text,
            chunk_size: self.chunk_size,
            step: self.chunk_size - self.overlap,
            byte_pos: 0,
            char_pos: 0,
            done: text.is_empty(),
        }
    }

    /// Number of windows `spans` yields for a text of `char_len` characters
    pub fn chunk_count(&self, char_len: usize) -> usize {
        if char_len == 0 {
            0
        } else if char_len <= self.chunk_size {
            1
        } else {
            let step = self.chunk_size - self.overlap;
            1 + (char_len - self.chunk_size).div_ceil(step)
        }
    }

    /// Chunk every page of a parsed document, in page order.
    ///
    /// Chunks never span a page break; `chunk_index` runs across the whole document.
    pub fn chunk_document(&self, doc: &Document, parsed: &ParsedDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in &parsed.pages {
            for span in self.spans(&page.content) {
                let source = ChunkSource {
                    filename: doc.filename.clone(),
                    file_type: doc.file_type,
                    page_number: page.page_number,
                    page_count: doc.total_pages,
                };

                chunks.push(Chunk::new(
                    doc.id,
                    span.text.to_string(),
                    source,
                    span.char_start,
                    span.char_end,
                    chunks.len() as u32,
                ));
            }
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        let config = ChunkingConfig::default();
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        }
    }
}

/// A window of text with its character offsets in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan<'a> {
    pub char_start: usize,
    pub char_end: usize,
    pub text: &'a str,
}

/// Iterator over the chunk windows of one text
#[derive(Debug, Clone)]
pub struct ChunkSpans<'a> {
    text: &'a str,
    chunk_size: usize,
    step: usize,
    byte_pos: usize,
    char_pos: usize,
    done: bool,
}

impl<'a> Iterator for ChunkSpans<'a> {
    type Item = TextSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.byte_pos..];

        let mut end = rest.len();
        let mut taken = 0usize;
        for (idx, _) in rest.char_indices() {
            if taken == self.chunk_size {
                end = idx;
                break;
            }
            taken += 1;
        }

        let span = TextSpan {
            char_start: self.char_pos,
            char_end: self.char_pos + taken,
            text: &rest[..end],
        };

        if end == rest.len() {
            self.done = true;
        } else {
            // step < chunk_size and the window stopped short of the end,
            // so the next start is always inside `rest`.
            let advance = rest
                .char_indices()
                .nth(self.step)
                .map(|(idx, _)| idx)
                .unwrap_or(rest.len());
            self.byte_pos += advance;
            self.char_pos += self.step;
        }

        Some(span)
    }
}

impl FusedIterator for ChunkSpans<'_> {}
