use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use std::sync::{Arc, Mutex};

use crate::ingestion::Embedder;

/// Sentence-transformer used when no model is configured
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_DIMENSION: usize = 384;

/// On-device sentence embeddings via ONNX Runtime.
///
/// The model is downloaded once into the fastembed cache and then runs
/// offline, so there is no request-rate limit.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl LocalEmbedder {
    /// Load `model_name` (a fastembed model code such as
    /// `sentence-transformers/all-MiniLM-L6-v2`); blocks while the model loads.
    pub fn new(model_name: &str, dimension: usize) -> Result<Self> {
        let model: EmbeddingModel = model_name
            .parse::<EmbeddingModel>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Unknown local embedding model '{}'", model_name))?;

        let embedding = TextEmbedding::try_new(TextInitOptions::new(model))
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to load local embedding model '{}'", model_name))?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        // Inference is CPU-bound; keep it off the async workers
        let vectors = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| anyhow::anyhow!("local embedding model lock poisoned"))?;
            model
                .embed(vec![text], None)
                .map_err(|e| anyhow::anyhow!("{}", e))
        })
        .await
        .context("Local embedding task failed")??;

        vectors
            .into_iter()
            .next()
            .context("Local model returned no embedding")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::distance;
    use crate::config::DistanceMetric;

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(LocalEmbedder::new("not-a-real/model", DEFAULT_DIMENSION).is_err());
    }

    #[tokio::test]
    #[ignore = "downloads all-MiniLM-L6-v2 on first run"]
    async fn test_related_text_is_nearer_than_lexical_decoy() {
        let embedder = LocalEmbedder::new(DEFAULT_MODEL, DEFAULT_DIMENSION).unwrap();

        let question = embedder.embed("How does the heart move blood?").await.unwrap();
        let relevant = embedder
            .embed("Cardiac muscle contractions pump circulation through the arteries.")
            .await
            .unwrap();
        let decoy = embedder.embed("How does the wind move sand?").await.unwrap();

        assert_eq!(question.len(), DEFAULT_DIMENSION);
        let d_relevant = distance(DistanceMetric::Cosine, &question, &relevant);
        let d_decoy = distance(DistanceMetric::Cosine, &question, &decoy);
        println!("relevant={:.4} decoy={:.4}", d_relevant, d_decoy);
        assert!(d_relevant < d_decoy);

        let car = embedder.embed("car").await.unwrap();
        let automobile = embedder.embed("automobile").await.unwrap();
        let banana = embedder.embed("banana").await.unwrap();
        assert!(
            distance(DistanceMetric::Cosine, &automobile, &car)
                < distance(DistanceMetric::Cosine, &automobile, &banana)
        );
    }
}
