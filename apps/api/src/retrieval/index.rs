//! In-memory embedding index over corpus chunks.
//!
//! Built once at startup and never mutated afterwards; request handlers share it
//! through `Arc<IndexState>` without locking. Lookup is an exhaustive cosine
//! scan, which is plenty for a corpus of a few hundred chunks.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::corpus::chunker::Chunker;
use crate::corpus::loader::{load_corpus, CorpusError};
use crate::corpus::DocumentChunk;
use crate::retrieval::embedder::{EmbedError, Embedder};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Corpus is empty; nothing to index")]
    EmptyCorpus,

    #[error("Corpus could not be loaded: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Embedding service failed: {0}")]
    Embedding(#[from] EmbedError),
}

struct IndexedChunk {
    chunk: DocumentChunk,
    vector: Vec<f32>,
}

pub struct EmbeddingIndex {
    entries: Vec<IndexedChunk>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("chunks", &self.entries.len())
            .finish()
    }
}

impl EmbeddingIndex {
    /// Embeds every chunk (in batches of `embedder.max_batch()`) and stores the vectors.
    pub async fn build(
        chunks: Vec<DocumentChunk>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let batch_size = embedder.max_batch().max(1);
        let mut entries = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(EmbedError::CountMismatch {
                    expected: batch.len(),
                    got: vectors.len(),
                }
                .into());
            }

            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(vectors)
                    .map(|(chunk, vector)| IndexedChunk { chunk, vector }),
            );
        }

        Ok(Self { entries, embedder })
    }

    /// Returns up to `k` chunks closest to `query`, nearest first.
    /// Equal scores keep corpus order.
    pub async fn lookup(&self, query: &str, k: usize) -> Result<Vec<DocumentChunk>, IndexError> {
        let query_vector = self
            .embedder
            .embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbedError::CountMismatch {
                expected: 1,
                got: 0,
            })?;

        Ok(self.nearest(&query_vector, k))
    }

    fn nearest(&self, query_vector: &[f32], k: usize) -> Vec<DocumentChunk> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query_vector, &entry.vector), entry))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(k)
            .map(|(_, entry)| entry.chunk.clone())
            .collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.entries.len()
    }
}

/// Lifecycle of the process-wide index.
#[derive(Debug, Default)]
pub enum IndexState {
    #[default]
    Unbuilt,
    Ready(EmbeddingIndex),
    Failed(IndexError),
}

impl IndexState {
    pub fn label(&self) -> &'static str {
        match self {
            IndexState::Unbuilt => "unbuilt",
            IndexState::Ready(_) => "ready",
            IndexState::Failed(_) => "failed",
        }
    }

    pub fn chunk_count(&self) -> usize {
        match self {
            IndexState::Ready(index) => index.chunk_count(),
            IndexState::Unbuilt | IndexState::Failed(_) => 0,
        }
    }
}

/// Loads, chunks and embeds the corpus. Never fails: errors become `IndexState::Failed`
/// so the server can still start and report the index as unavailable.
pub async fn build_index_state(
    root: &Path,
    corpus_file: &str,
    chunker: &Chunker,
    embedder: Arc<dyn Embedder>,
) -> IndexState {
    let result = async {
        let documents = match load_corpus(root, corpus_file) {
            Ok(docs) => docs,
            Err(CorpusError::EmptyCorpus(_)) => return Err(IndexError::EmptyCorpus),
            Err(e) => return Err(IndexError::Corpus(e)),
        };

        let chunks = chunker.split_documents(&documents);
        info!(
            "Split {} document(s) into {} chunk(s)",
            documents.len(),
            chunks.len()
        );

        EmbeddingIndex::build(chunks, embedder).await
    }
    .await;

    match result {
        Ok(index) => {
            info!("Embedding index ready ({} chunks)", index.chunk_count());
            IndexState::Ready(index)
        }
        Err(e) => {
            warn!("Embedding index unavailable: {e}");
            IndexState::Failed(e)
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let score = dot / (norm_a * norm_b);
    // Zero-norm and non-finite vectors rank as unrelated.
    if score.is_finite() {
        score
    } else {
        0.0
    }
}
