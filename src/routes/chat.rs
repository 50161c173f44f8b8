use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::load_document;
use crate::errors::{AppError, Result};
use crate::llm::answer_question;
use crate::models::{AnswerResponse, AskQuestionRequest};
use crate::search::retrieve_context;
use crate::state::AppState;
use crate::utils::render_markdown;

/// Answer a question about one document from its nearest chunks
///
/// POST /ask_question/:doc_id
pub async fn ask_question(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    payload: std::result::Result<Json<AskQuestionRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>> {
    let Json(payload) =
        payload.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let question = payload
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("No question provided".to_string()))?
        .to_string();

    let doc = load_document(&state, &doc_id).await?;

    let chunks = retrieve_context(
        state.store.as_ref(),
        state.embedder.as_ref(),
        doc.id,
        &question,
        state.config.ingestion.top_k,
    )
    .await?;

    tracing::info!(
        doc_id = %doc.id,
        question_chars = question.len(),
        context_chunks = chunks.len(),
        "Answering question"
    );

    let answer = answer_question(state.generator.as_ref(), &question, &chunks).await?;

    Ok(Json(AnswerResponse {
        status: "success".to_string(),
        answer: render_markdown(&answer),
    }))
}
