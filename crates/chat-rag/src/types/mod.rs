//! Core types for the RAG pipeline

pub mod chat;
pub mod document;

pub use chat::{ChatMessage, Role};
pub use document::{Chunk, ChunkSource, Document, FileType};
