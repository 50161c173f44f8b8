use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};
use minijinja::context;

use super::load_document;
use crate::errors::Result;
use crate::ingestion::document_text;
use crate::llm::{generate_flashcards as build_flashcards, summarize as build_summary};
use crate::models::{Document, Flashcard};
use crate::state::AppState;
use crate::utils::render_markdown;

/// Chunks fed to the flashcard prompt
const FLASHCARD_CONTEXT_CHUNKS: usize = 12;

/// Summary page for a document
///
/// GET /summarize/:doc_id
pub async fn summarize(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<(StatusCode, Html<String>)> {
    let doc = load_document(&state, &doc_id).await?;

    let Some(text) = document_text(&state, &doc).await? else {
        let page = state.views.render(
            "summary.html",
            context! {
                doc_id => doc.id.to_string(),
                file_name => &doc.file_name,
                error => "Failed to extract text from the PDF.",
            },
        )?;
        return Ok((StatusCode::OK, page));
    };

    match build_summary(state.generator.as_ref(), &text).await {
        Ok(summary) => {
            let page = state.views.render(
                "summary.html",
                context! {
                    doc_id => doc.id.to_string(),
                    file_name => &doc.file_name,
                    summary_html => render_markdown(&summary),
                },
            )?;
            Ok((StatusCode::OK, page))
        }
        Err(e) => {
            tracing::warn!(doc_id = %doc.id, error = %e, "Summary generation failed");
            let page = state.views.render(
                "summary.html",
                context! {
                    doc_id => doc.id.to_string(),
                    file_name => &doc.file_name,
                    error => e.to_string(),
                },
            )?;
            Ok((e.status_code(), page))
        }
    }
}

/// Flashcards page for a document; generation problems show as a single card
///
/// GET /generate_flashcards/:doc_id
pub async fn generate_flashcards(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Html<String>> {
    let doc = load_document(&state, &doc_id).await?;

    let text = flashcard_source_text(&state, &doc).await;
    let cards: Vec<Flashcard> = build_flashcards(state.generator.as_ref(), text.as_deref())
        .await
        .into_iter()
        .map(|card| Flashcard::new(render_markdown(&card.question), render_markdown(&card.answer)))
        .collect();

    state.views.render(
        "flashcards.html",
        context! {
            doc_id => doc.id.to_string(),
            file_name => &doc.file_name,
            cards => cards,
        },
    )
}

/// Leading stored chunks, or the full text when the document has none yet
async fn flashcard_source_text(state: &AppState, doc: &Document) -> Option<String> {
    match state.store.chunk_texts(doc.id, FLASHCARD_CONTEXT_CHUNKS).await {
        Ok(chunks) if !chunks.is_empty() => return Some(chunks.join("\n\n")),
        Ok(_) => {}
        Err(e) => tracing::warn!(doc_id = %doc.id, error = %e, "Could not load chunks"),
    }

    match document_text(state, doc).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(doc_id = %doc.id, error = %e, "Could not extract text for flashcards");
            None
        }
    }
}
