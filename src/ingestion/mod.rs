pub mod chunker;
pub mod extractors;
pub mod embedder;
pub mod processor;

pub use chunker::{Chunk, ChunkConfig, chunk_text};
pub use extractors::{PageText, extract_pdf_pages, extract_pdf_text, join_pages};
pub use embedder::{EmbeddedChunk, Embedder, HashEmbedder, embed_text, generate_embeddings};
pub use processor::{document_text, process_document, spawn_ingestion, NO_EXTRACTABLE_TEXT};
