pub mod chat;
pub mod documents;
pub mod health;
pub mod pages;
pub mod study;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::Document;
use crate::state::AppState;

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Creates the router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .merge(health::routes())
        .route("/", get(pages::index))
        .route("/chat/:doc_id", get(pages::chat_page))
        .route("/upload_pdf", post(documents::upload_pdf))
        .route("/documents/:doc_id/status", get(documents::document_status))
        .route("/get_text/:doc_id", get(documents::get_text))
        .route("/summarize/:doc_id", get(study::summarize))
        .route("/generate_flashcards/:doc_id", get(study::generate_flashcards))
        .route("/ask_question/:doc_id", post(chat::ask_question))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Parse a path segment as a document id
pub(crate) fn parse_document_id(raw: &str) -> Result<Uuid> {
    Ok(Uuid::parse_str(raw.trim())?)
}

/// Load a document by its raw path id: 400 if malformed, 404 if unknown
pub(crate) async fn load_document(state: &AppState, raw_id: &str) -> Result<Document> {
    let id = parse_document_id(raw_id)?;
    state
        .store
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
}
