use crate::db::DocumentStore;
use crate::errors::Result;
use crate::ingestion::{embed_text, Embedder};
use crate::models::RetrievedChunk;
use uuid::Uuid;

/// Embed `question` and return the `limit` nearest chunks of one document.
///
/// Must be given the same embedder that ingested the document.
pub async fn retrieve_context(
    store: &dyn DocumentStore,
    embedder: &dyn Embedder,
    doc_id: Uuid,
    question: &str,
    limit: usize,
) -> Result<Vec<RetrievedChunk>> {
    let query_embedding = embed_text(embedder, question).await?;

    let results = store.nearest_chunks(doc_id, &query_embedding, limit).await?;

    tracing::debug!(
        doc_id = %doc_id,
        metric = ?store.distance(),
        found = results.len(),
        closest = results.first().map(|r| r.distance),
        "Vector search complete"
    );

    Ok(results)
}
