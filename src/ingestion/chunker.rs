use crate::errors::{AppError, Result};
use text_splitter::TextSplitter;

/// A chunk of document text with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
    /// Byte offset of the chunk in the source text
    pub start_byte: usize,
    pub end_byte: usize,
}

/// Configuration for text chunking
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub chunk_size: usize, // Characters per chunk
    pub overlap: usize,    // Character overlap between chunks
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

impl From<&crate::config::IngestionConfig> for ChunkConfig {
    fn from(config: &crate::config::IngestionConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        }
    }
}

/// Split text into overlapping windows of at most `chunk_size` characters.
///
/// The splitter works down the semantic levels (paragraphs, sentences, words,
/// graphemes) and only cuts inside a level when nothing larger fits.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Result<Vec<Chunk>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let splitter_config = text_splitter::ChunkConfig::new(config.chunk_size)
        .with_overlap(config.overlap)
        .map_err(|e| AppError::Internal(format!("Invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(splitter_config);

    let chunks = splitter
        .chunk_indices(text)
        .enumerate()
        .map(|(index, (offset, content))| Chunk {
            index,
            content: content.to_string(),
            start_byte: offset,
            end_byte: offset + content.len(),
        })
        .collect();

    Ok(chunks)
}
