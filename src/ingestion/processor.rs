use crate::errors::{AppError, Result};
use crate::ingestion::{chunk_text, extract_pdf_text, generate_embeddings, ChunkConfig};
use crate::models::{Document, DocumentStatus};
use crate::state::AppState;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const NO_EXTRACTABLE_TEXT: &str = "No extractable text";

/// Process a stored PDF: extract → chunk → embed → store.
///
/// Returns the number of chunks stored; 0 means the document had no text and
/// was marked failed. Any error also leaves the document failed with a message.
pub async fn process_document(state: &AppState, doc_id: Uuid) -> Result<usize> {
    let doc = state
        .store
        .get_document(doc_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", doc_id)))?;

    state
        .store
        .update_status(doc_id, DocumentStatus::Processing, None)
        .await?;

    match run_pipeline(state, &doc).await {
        Ok(0) => {
            tracing::warn!(doc_id = %doc_id, "Document has no extractable text");
            state
                .store
                .update_status(doc_id, DocumentStatus::Failed, Some(NO_EXTRACTABLE_TEXT))
                .await?;
            Ok(0)
        }
        Ok(stored) => {
            tracing::info!(doc_id = %doc_id, chunks = stored, "Document processed");
            Ok(stored)
        }
        Err(e) => {
            tracing::error!(doc_id = %doc_id, error = %e, "Document processing failed");
            state
                .store
                .update_status(doc_id, DocumentStatus::Failed, Some(&e.to_string()))
                .await?;
            Err(e)
        }
    }
}

async fn run_pipeline(state: &AppState, doc: &Document) -> Result<usize> {
    let pdf_bytes = state.blobs.download_object(&doc.storage_path).await?;

    let Some(text) = extract_text_blocking(pdf_bytes).await? else {
        return Ok(0);
    };
    tracing::debug!(doc_id = %doc.id, chars = text.len(), "Extracted document text");

    let config = ChunkConfig::from(&state.config.ingestion);
    let chunks = chunk_text(&text, &config)?;
    if chunks.is_empty() {
        return Ok(0);
    }

    let embedded = generate_embeddings(state.embedder.as_ref(), chunks).await?;

    state.store.store_chunks(doc.id, &embedded).await
}

/// PDF parsing is CPU-bound; keep it off the async workers
async fn extract_text_blocking(pdf_bytes: Vec<u8>) -> Result<Option<String>> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&pdf_bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Text extraction task failed: {}", e)))
}

/// Run [`process_document`] on the runtime without waiting for it
pub fn spawn_ingestion(state: AppState, doc_id: Uuid) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Failures are recorded on the document; nothing else to do here
        if let Err(e) = process_document(&state, doc_id).await {
            tracing::debug!(doc_id = %doc_id, error = %e, "Background ingestion ended with error");
        }
    })
}

/// Full text of a stored document, or `None` if its file is missing or has no text
pub async fn document_text(state: &AppState, doc: &Document) -> Result<Option<String>> {
    if !state.blobs.object_exists(&doc.storage_path).await? {
        tracing::warn!(doc_id = %doc.id, path = %doc.storage_path, "Stored file missing");
        return Ok(None);
    }

    let pdf_bytes = state.blobs.download_object(&doc.storage_path).await?;
    extract_text_blocking(pdf_bytes).await
}
