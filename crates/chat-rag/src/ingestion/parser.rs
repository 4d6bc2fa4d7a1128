//! Document parsing into page-level text

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed document with extracted page text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the extracted text
    pub content_hash: String,
    /// Page-level content in document order
    pub pages: Vec<PageContent>,
}

impl ParsedDocument {
    fn new(file_type: FileType, pages: Vec<PageContent>) -> Self {
        let mut hasher = Sha256::new();
        for page in &pages {
            hasher.update(page.content.as_bytes());
        }
        Self {
            file_type,
            content_hash: hex::encode(hasher.finalize()),
            pages,
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// True when no page holds any text
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.content.is_empty())
    }
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Text content of the page
    pub content: String,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);

        if !file_type.is_supported() {
            return Err(Error::UnsupportedFileType(format!(
                "{} ({})",
                filename,
                file_type.display_name()
            )));
        }

        match file_type {
            #[cfg(feature = "pdf")]
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data, file_type),
            _ => Err(Error::UnsupportedFileType(filename.to_string())),
        }
    }

    /// Read and parse a file from disk. `filename` decides the format.
    pub fn parse_path(path: &Path, filename: &str) -> Result<ParsedDocument> {
        let data = std::fs::read(path)?;
        Self::parse(filename, &data)
    }

    /// Parse UTF-8 text as a single page
    fn parse_text(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::file_parse(filename, format!("Invalid UTF-8: {}", e)))?;

        let pages = vec![PageContent {
            page_number: 1,
            content: normalize_page(content),
        }];

        Ok(ParsedDocument::new(file_type, pages))
    }

    /// Parse a PDF page by page
    #[cfg(feature = "pdf")]
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().into_keys() {
            match doc.extract_text(&[page_number]) {
                Ok(text) => pages.push(PageContent {
                    page_number,
                    content: normalize_page(&text),
                }),
                Err(e) => {
                    tracing::warn!(
                        "Per-page extraction failed for {} page {}: {}, trying fallback",
                        filename,
                        page_number,
                        e
                    );
                    return Self::parse_pdf_fallback(filename, data);
                }
            }
        }

        tracing::debug!("Extracted {} pages from {}", pages.len(), filename);
        Ok(ParsedDocument::new(FileType::Pdf, pages))
    }

    /// Whole-document extraction with pdf-extract, reported as a single page
    #[cfg(feature = "pdf")]
    fn parse_pdf_fallback(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to extract text: {}", e)))?;

        let pages = vec![PageContent {
            page_number: 1,
            content: normalize_page(&text),
        }];

        Ok(ParsedDocument::new(FileType::Pdf, pages))
    }
}

/// Drop NUL bytes and collapse whitespace-only pages to empty
fn normalize_page(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    if text.contains('\0') {
        text.replace('\0', "")
    } else {
        text.to_string()
    }
}
