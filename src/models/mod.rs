pub mod document;
pub mod study;

pub use document::{
    storage_path_for, AskQuestionRequest, AnswerResponse, Document, DocumentStatus,
    DocumentStatusResponse, ExtractedTextResponse, RetrievedChunk, UploadResponse,
};
pub use study::Flashcard;
