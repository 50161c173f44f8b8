use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Uploaded PDF and its processing state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub page_count: Option<i32>,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub chunk_count: i32,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Document {
    /// A freshly uploaded document, not yet processed
    pub fn uploaded(
        id: Uuid,
        user_id: &str,
        file_name: &str,
        page_count: Option<i32>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            storage_path: storage_path_for(user_id, id, file_name),
            page_count,
            status: DocumentStatus::Uploaded,
            error_message: None,
            chunk_count: 0,
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}

/// Blob path for a document, namespaced by owner and document id
pub fn storage_path_for(user_id: &str, doc_id: Uuid, file_name: &str) -> String {
    format!("uploads/{}/{}/{}", user_id, doc_id, file_name)
}

/// Processing status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "document_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Processed,
    Failed,
}

/// Stored chunk returned by a nearest-neighbour query
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RetrievedChunk {
    pub chunk_index: i32,
    pub content: String,
    pub distance: f64,
}

/// Response after a successful upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
    pub document_id: Uuid,
}

/// Processing status response
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentStatusResponse {
    pub document_id: Uuid,
    pub status: DocumentStatus,
    pub chunk_count: i32,
    pub error_message: Option<String>,
}

impl From<Document> for DocumentStatusResponse {
    fn from(doc: Document) -> Self {
        Self {
            document_id: doc.id,
            status: doc.status,
            chunk_count: doc.chunk_count,
            error_message: doc.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskQuestionRequest {
    pub question: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub status: String,
    /// Answer rendered from Markdown to HTML
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractedTextResponse {
    pub status: String,
    pub document_id: Uuid,
    pub character_count: usize,
    pub extracted_text_preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_document_defaults() {
        let id = Uuid::new_v4();
        let doc = Document::uploaded(id, "user-1", "notes.pdf", Some(3));

        assert_eq!(doc.status, DocumentStatus::Uploaded);
        assert_eq!(doc.chunk_count, 0);
        assert_eq!(doc.storage_path, format!("uploads/user-1/{}/notes.pdf", id));
        assert!(doc.processed_at.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&DocumentStatus::Processed).unwrap();
        assert_eq!(json, "\"processed\"");
    }
}
