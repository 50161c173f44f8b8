use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::DocumentStore;
use crate::config::DistanceMetric;
use crate::errors::{AppError, Result};
use crate::ingestion::EmbeddedChunk;
use crate::models::{Document, DocumentStatus, RetrievedChunk};

#[derive(Debug, Clone)]
struct StoredChunk {
    chunk_index: i32,
    content: String,
    embedding: Vec<f32>,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Vec<StoredChunk>>,
}

/// Process-local store with exact nearest-neighbour search.
///
/// Used when no database is configured, and by tests.
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
    distance: DistanceMetric,
}

impl InMemoryDocumentStore {
    pub fn new(distance: DistanceMetric) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            distance,
        }
    }

    pub async fn document_count(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    /// Stored vectors of one document in chunk order
    pub async fn stored_embeddings(&self, id: Uuid) -> Vec<Vec<f32>> {
        let inner = self.inner.read().await;
        let mut chunks = inner.chunks.get(&id).cloned().unwrap_or_default();
        chunks.sort_by_key(|c| c.chunk_index);
        chunks.into_iter().map(|c| c.embedding).collect()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(DistanceMetric::Euclidean)
    }
}

/// Distance between two vectors under `metric`; lower is closer
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f64 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| {
                let d = (*x - *y) as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Cosine => {
            let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
            let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
            let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                // pgvector yields NaN here; treat as maximally distant instead
                1.0
            } else {
                1.0 - dot / (norm_a * norm_b)
            }
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn distance(&self) -> DistanceMetric {
        self.distance
    }

    async fn insert_document(&self, doc: &Document) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.documents.contains_key(&doc.id) {
            return Err(AppError::Internal(format!(
                "Document {} already exists",
                doc.id
            )));
        }
        inner.documents.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.inner.read().await.documents.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(doc) = inner.documents.get_mut(&id) {
            doc.status = status;
            doc.error_message = error_message.map(str::to_string);
        }
        Ok(())
    }

    async fn store_chunks(&self, id: Uuid, chunks: &[EmbeddedChunk]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        if !inner.documents.contains_key(&id) {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }

        let stored = chunks
            .iter()
            .map(|c| StoredChunk {
                chunk_index: c.chunk.index as i32,
                content: c.chunk.content.clone(),
                embedding: c.embedding.clone(),
            })
            .collect::<Vec<_>>();
        inner.chunks.insert(id, stored);

        if let Some(doc) = inner.documents.get_mut(&id) {
            doc.status = DocumentStatus::Processed;
            doc.chunk_count = chunks.len() as i32;
            doc.processed_at = Some(chrono::Utc::now());
            doc.error_message = None;
        }

        Ok(chunks.len())
    }

    async fn nearest_chunks(
        &self,
        id: Uuid,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let inner = self.inner.read().await;
        let Some(chunks) = inner.chunks.get(&id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<RetrievedChunk> = chunks
            .iter()
            .map(|c| RetrievedChunk {
                chunk_index: c.chunk_index,
                content: c.content.clone(),
                distance: distance(self.distance, &c.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn chunk_texts(&self, id: Uuid, limit: usize) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut chunks = inner.chunks.get(&id).cloned().unwrap_or_default();
        chunks.sort_by_key(|c| c.chunk_index);

        Ok(chunks.into_iter().take(limit).map(|c| c.content).collect())
    }

    async fn count_chunks(&self, id: Uuid) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner.chunks.get(&id).map(|c| c.len()).unwrap_or(0) as i64)
    }

    async fn fail_interrupted(&self) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut count = 0;
        for doc in inner.documents.values_mut() {
            if doc.status == DocumentStatus::Processing {
                doc.status = DocumentStatus::Failed;
                doc.error_message = Some("Processing interrupted by server restart".to_string());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
