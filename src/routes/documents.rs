use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use super::load_document;
use crate::config::IngestionMode;
use crate::errors::{AppError, Result};
use crate::ingestion::{document_text, process_document, spawn_ingestion};
use crate::models::{Document, DocumentStatusResponse, ExtractedTextResponse, UploadResponse};
use crate::state::AppState;
use crate::utils::{extract_pdf_metadata, has_pdf_extension, sanitize_filename, PdfMetadata};

const UPLOAD_FIELD: &str = "pdf_file";
const PREVIEW_CHARS: usize = 500;

/// Accept a PDF upload, store it and start ingestion
///
/// POST /upload_pdf (multipart field `pdf_file`)
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut multipart =
        multipart.map_err(|e| AppError::BadRequest(format!("Expected a multipart upload: {}", e)))?;

    let (raw_name, bytes) = read_upload_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("No PDF file found in request".to_string()))?;

    if raw_name.trim().is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }

    let file_name = sanitize_filename(&raw_name);
    if !has_pdf_extension(&raw_name) || !has_pdf_extension(&file_name) {
        return Err(AppError::BadRequest(
            "Invalid file type. Only PDFs are allowed.".to_string(),
        ));
    }

    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    let max_bytes = state.config.max_upload_bytes();
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} MB upload limit",
            state.config.server.max_upload_size_mb
        )));
    }

    let doc_id = Uuid::new_v4();
    let metadata = read_pdf_metadata(bytes.clone()).await;
    let doc = Document::uploaded(
        doc_id,
        &state.config.server.default_user_id,
        &file_name,
        metadata.as_ref().map(|m| m.page_count),
    );

    state
        .blobs
        .put_object(&doc.storage_path, bytes.to_vec(), "application/pdf")
        .await?;

    if let Err(e) = state.store.insert_document(&doc).await {
        // Don't leave a blob behind that no record points at
        if let Err(cleanup) = state.blobs.delete_object(&doc.storage_path).await {
            tracing::error!(
                doc_id = %doc_id,
                error = %cleanup,
                "Failed to remove blob after metadata insert failed"
            );
        }
        return Err(e);
    }

    tracing::info!(
        doc_id = %doc_id,
        file_name = %file_name,
        size_bytes = bytes.len(),
        page_count = ?doc.page_count,
        title = ?metadata.and_then(|m| m.title),
        "PDF uploaded"
    );

    let message = match state.config.ingestion.mode {
        IngestionMode::Background => {
            spawn_ingestion(state.clone(), doc_id);
            "PDF uploaded and processing started!"
        }
        IngestionMode::Inline => match process_document(&state, doc_id).await {
            Ok(stored) if stored > 0 => "PDF uploaded and processed.",
            // The failure is recorded on the document and visible via the status endpoint
            _ => "PDF uploaded.",
        },
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            status: "success".to_string(),
            message: message.to_string(),
            document_id: doc_id,
        }),
    ))
}

/// First `pdf_file` field of the form: (client filename, bytes)
async fn read_upload_field(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some((file_name, bytes)));
    }

    Ok(None)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        AppError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// Page count and title from the PDF; `None` if lopdf cannot parse it
async fn read_pdf_metadata(bytes: Bytes) -> Option<PdfMetadata> {
    let parsed = tokio::task::spawn_blocking(move || extract_pdf_metadata(&bytes)).await;

    match parsed {
        Ok(Ok(metadata)) => Some(metadata),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Could not read PDF metadata");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "PDF metadata task failed");
            None
        }
    }
}

/// Get processing status for a document
///
/// GET /documents/:doc_id/status
pub async fn document_status(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<DocumentStatusResponse>> {
    let doc = load_document(&state, &doc_id).await?;
    Ok(Json(doc.into()))
}

/// Preview the text extracted from a document
///
/// GET /get_text/:doc_id
pub async fn get_text(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Response> {
    let doc = load_document(&state, &doc_id).await?;

    let Some(text) = document_text(&state, &doc).await? else {
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": "Failed to extract text from the PDF.",
            })),
        )
            .into_response());
    };

    let preview: String = text.chars().take(PREVIEW_CHARS).collect();

    Ok(Json(ExtractedTextResponse {
        status: "success".to_string(),
        document_id: doc.id,
        character_count: text.chars().count(),
        extracted_text_preview: format!("{}...", preview),
    })
    .into_response())
}
