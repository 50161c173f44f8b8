use crate::errors::{AppError, Result};
use crate::ingestion::Chunk;
use async_trait::async_trait;
use std::time::Duration;

/// Turns text into a fixed-dimension vector.
///
/// Ingestion and retrieval must share one implementation; vectors from
/// different embedders live in different spaces.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short provider/model label for logs
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    /// Pause before each call, for providers with a request-rate limit
    fn call_delay(&self) -> Duration {
        Duration::ZERO
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// A chunk paired with its embedding
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Embed a single text and check the vector size
pub async fn embed_text(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let embedding = embedder
        .embed(text)
        .await
        .map_err(|e| AppError::Upstream(format!("{} embedding failed: {:#}", embedder.name(), e)))?;

    if embedding.len() != embedder.dimension() {
        return Err(AppError::Upstream(format!(
            "{} returned a {}-dimensional vector, expected {}",
            embedder.name(),
            embedding.len(),
            embedder.dimension()
        )));
    }

    Ok(embedding)
}

/// Embed chunks one at a time, honouring the embedder's call delay.
///
/// The first failure aborts the whole batch so nothing partial reaches the store.
pub async fn generate_embeddings(
    embedder: &dyn Embedder,
    chunks: Vec<Chunk>,
) -> Result<Vec<EmbeddedChunk>> {
    let delay = embedder.call_delay();
    let mut results = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let embedding = embed_text(embedder, &chunk.content).await?;
        results.push(EmbeddedChunk { chunk, embedding });
    }

    tracing::debug!(
        embedder = embedder.name(),
        count = results.len(),
        "Generated chunk embeddings"
    );

    Ok(results)
}

/// Deterministic byte-hash vectors (L2-normalised) for tests and offline runs.
///
/// Texts only land near each other when they share spelling, not meaning;
/// real retrieval uses `ai::local::LocalEmbedder` or a hosted model.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(hash_embedding(text, self.dimension))
    }
}

fn hash_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut embedding = vec![0.0f32; dimension];
    if dimension == 0 {
        return embedding;
    }

    // Bucket lowercase word trigrams so shared vocabulary means nearby vectors
    for word in text.split_whitespace() {
        let word = word.to_lowercase();
        let bytes = word.as_bytes();
        for window in bytes.windows(3.min(bytes.len()).max(1)) {
            let mut hash: u64 = 0xcbf29ce484222325;
            for b in window {
                hash ^= *b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            let idx = (hash % dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[idx] += sign;
        }
    }

    // Normalize the embedding vector (L2 normalization)
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for val in &mut embedding {
            *val /= magnitude;
        }
    }

    embedding
}
