//! Local embedders that need no external service

pub mod hashing;

pub use hashing::HashingEmbedder;
