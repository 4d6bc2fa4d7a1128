//! Vector store for chunk storage and search

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::EmbeddingConfig;
use crate::error::{bounded, Error, Result, EMBEDDING_OPERATION};
use crate::providers::{EmbeddingProvider, IndexEntry, SearchResult, VectorIndex};
use crate::types::Chunk;

/// Snapshot file inside the persistence directory
pub const INDEX_FILE: &str = "index.json";

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    dimensions: usize,
    entries: &'a [IndexEntry],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// Persistent brute-force cosine index
///
/// All entries live in memory; `persist` writes them to `<dir>/index.json`
/// by writing a temp file next to it and renaming it into place, so a crash
/// mid-write leaves the previous snapshot intact.
pub struct LocalVectorStore {
    dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    embed_timeout: Duration,
    entries: RwLock<Vec<IndexEntry>>,
    /// Bumped on every successful `add`
    generation: AtomicU64,
    /// Generation last written to disk. The lock also serialises writers.
    persisted: Mutex<u64>,
}

impl LocalVectorStore {
    /// Open the index stored in `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let entries = load_snapshot(&dir.join(INDEX_FILE), embedder.dimensions())?;
        tracing::info!(
            "Opened vector index at {} with {} entries (embedder: {})",
            dir.display(),
            entries.len(),
            embedder.name()
        );

        Ok(Self {
            dir,
            embedder,
            embed_timeout: EmbeddingConfig::default().timeout(),
            entries: RwLock::new(entries),
            generation: AtomicU64::new(0),
            persisted: Mutex::new(0),
        })
    }

    /// Deadline for each embedding call
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Persistence directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn load_snapshot(path: &Path, dimensions: usize) -> Result<Vec<IndexEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let data = std::fs::read(path)?;
    let snapshot: Snapshot = serde_json::from_slice(&data)?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(Error::vector_db(format!(
            "Unsupported index version {} in {}",
            snapshot.version,
            path.display()
        )));
    }
    if !snapshot.entries.is_empty() && snapshot.dimensions != dimensions {
        return Err(Error::vector_db(format!(
            "Index at {} holds {}-dimensional vectors but the embedder produces {}",
            path.display(),
            snapshot.dimensions,
            dimensions
        )));
    }

    Ok(snapshot.entries)
}

fn write_snapshot(dir: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(dir.join(INDEX_FILE))
        .map_err(|e| Error::vector_db(format!("Failed to replace index snapshot: {}", e)))?;
    Ok(())
}

/// Embed a batch of chunks, one deadline-bounded request per chunk.
///
/// Nothing is returned unless every chunk embedded.
pub(crate) async fn embed_entries(
    embedder: &dyn EmbeddingProvider,
    timeout: Duration,
    chunks: &[Chunk],
) -> Result<Vec<IndexEntry>> {
    let dimensions = embedder.dimensions();
    let mut entries = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let embedding =
            bounded(EMBEDDING_OPERATION, timeout, embedder.embed(&chunk.content)).await?;
        if embedding.len() != dimensions {
            return Err(Error::embedding(format!(
                "{} returned {} dimensions, expected {}",
                embedder.name(),
                embedding.len(),
                dimensions
            )));
        }
        entries.push(IndexEntry {
            chunk: chunk.clone(),
            embedding,
        });
    }

    Ok(entries)
}

/// Embed a query under the same deadline as ingestion
pub(crate) async fn embed_query(
    embedder: &dyn EmbeddingProvider,
    timeout: Duration,
    query: &str,
) -> Result<Vec<f32>> {
    bounded(EMBEDDING_OPERATION, timeout, embedder.embed(query)).await
}

/// Cosine similarity; 0.0 for zero vectors or mismatched lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Top `top_k` entries by similarity to `query`, most similar first.
///
/// Equal scores keep insertion order.
pub fn rank(entries: &[IndexEntry], query: &[f32], top_k: usize) -> Vec<SearchResult> {
    let mut scored: Vec<(usize, f32)> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(i, similarity)| SearchResult {
            chunk: entries[i].chunk.clone(),
            similarity,
        })
        .collect()
}

#[async_trait]
impl VectorIndex for LocalVectorStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let new_entries = embed_entries(self.embedder.as_ref(), self.embed_timeout, chunks).await?;
        let added = new_entries.len();

        self.entries.write().extend(new_entries);
        self.generation.fetch_add(1, Ordering::SeqCst);

        tracing::debug!("Added {} entries to {}", added, self.dir.display());
        Ok(added)
    }

    async fn persist(&self) -> Result<()> {
        let mut persisted = self.persisted.lock().await;

        let generation = self.generation.load(Ordering::SeqCst);
        if generation == *persisted && self.dir.join(INDEX_FILE).exists() {
            tracing::debug!("Index unchanged since last persist, skipping write");
            return Ok(());
        }

        let bytes = {
            let entries = self.entries.read();
            serde_json::to_vec(&SnapshotRef {
                version: SNAPSHOT_VERSION,
                dimensions: self.embedder.dimensions(),
                entries: &entries,
            })?
        };

        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&dir, &bytes))
            .await
            .map_err(|e| Error::internal(format!("Persist task failed: {}", e)))??;

        *persisted = generation;
        tracing::info!("Persisted vector index to {}", self.dir.display());
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 || self.entries.read().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embed_query(self.embedder.as_ref(), self.embed_timeout, query).await?;

        let entries = self.entries.read();
        Ok(rank(&entries, &query_embedding, top_k))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;

    fn embedder() -> Arc<dyn EmbeddingProvider> {
        Arc::new(HashingEmbedder::new(256).unwrap())
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("model unavailable"))
        }

        fn dimensions(&self) -> usize {
            64
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Healthy per call, slow in aggregate
    struct SlowEmbedder {
        inner: HashingEmbedder,
        delay: Duration,
    }

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(self.delay).await;
            self.inner.embed(text).await
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_deadline_applies_per_embedding_call() {
        let dir = tempfile::tempdir().unwrap();
        let slow = Arc::new(SlowEmbedder {
            inner: HashingEmbedder::new(32).unwrap(),
            delay: Duration::from_millis(30),
        });
        let store = LocalVectorStore::open(dir.path(), slow)
            .unwrap()
            .with_embed_timeout(Duration::from_millis(200));

        let chunks: Vec<Chunk> = (0..20)
            .map(|i| Chunk::from_text("a.txt", format!("chunk {}", i)))
            .collect();
        assert_eq!(store.add(&chunks).await.unwrap(), 20);
        assert_eq!(store.len().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_single_slow_call_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let slow = Arc::new(SlowEmbedder {
            inner: HashingEmbedder::new(32).unwrap(),
            delay: Duration::from_millis(300),
        });
        let store = LocalVectorStore::open(dir.path(), slow)
            .unwrap()
            .with_embed_timeout(Duration::from_millis(50));

        let err = store.add(&[Chunk::from_text("a.txt", "text")]).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.is_embedding_failure());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_and_keeps_ties_stable() {
        let entry = |text: &str, embedding: Vec<f32>| IndexEntry {
            chunk: Chunk::from_text("t.txt", text),
            embedding,
        };
        let entries = vec![
            entry("low", vec![0.0, 1.0]),
            entry("tie-a", vec![1.0, 0.0]),
            entry("tie-b", vec![2.0, 0.0]),
        ];

        let ranked = rank(&entries, &[1.0, 0.0], 10);
        let order: Vec<&str> = ranked.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(order, vec!["tie-a", "tie-b", "low"]);

        assert_eq!(rank(&entries, &[1.0, 0.0], 1).len(), 1);
    }

    #[tokio::test]
    async fn test_add_search_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path(), embedder()).unwrap();
        assert!(store.is_empty().await.unwrap());
        assert!(store.search("anything", 3).await.unwrap().is_empty());

        let chunks = vec![
            Chunk::from_text("a.txt", "The sky is blue."),
            Chunk::from_text("b.txt", "Grass is green."),
        ];
        assert_eq!(store.add(&chunks).await.unwrap(), 2);
        store.persist().await.unwrap();

        let results = store.search("What color is the sky?", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "The sky is blue.");

        drop(store);
        let reopened = LocalVectorStore::open(dir.path(), embedder()).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);
        let results = reopened.search("sky", 1).await.unwrap();
        assert_eq!(results[0].chunk, chunks[0]);
    }

    #[tokio::test]
    async fn test_unpersisted_entries_are_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path(), embedder()).unwrap();
        store.add(&[Chunk::from_text("a.txt", "kept")]).await.unwrap();
        store.persist().await.unwrap();
        store.add(&[Chunk::from_text("a.txt", "lost")]).await.unwrap();
        drop(store);

        let reopened = LocalVectorStore::open(dir.path(), embedder()).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persist_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path(), embedder()).unwrap();
        store.add(&[Chunk::from_text("a.txt", "one")]).await.unwrap();

        store.persist().await.unwrap();
        let first = std::fs::read(dir.path().join(INDEX_FILE)).unwrap();
        store.persist().await.unwrap();
        let second = std::fs::read(dir.path().join(INDEX_FILE)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path(), embedder()).unwrap();
        let chunk = Chunk::from_text("a.txt", "same text");
        store.add(&[chunk.clone()]).await.unwrap();
        store.add(&[chunk]).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path(), Arc::new(FailingEmbedder)).unwrap();

        let err = store.add(&[Chunk::from_text("a.txt", "text")]).await.unwrap_err();
        assert!(err.is_embedding_failure());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path(), embedder()).unwrap();
        store.add(&[Chunk::from_text("a.txt", "text")]).await.unwrap();
        store.persist().await.unwrap();

        let other: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(32).unwrap());
        let err = LocalVectorStore::open(dir.path(), other).err().unwrap();
        assert!(matches!(err, Error::VectorDb(_)));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"{not json").unwrap();
        assert!(matches!(
            LocalVectorStore::open(dir.path(), embedder()),
            Err(Error::Json(_))
        ));
    }
}
