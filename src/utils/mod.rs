pub mod filename;
pub mod markdown;
pub mod pdf;

pub use filename::{has_pdf_extension, sanitize_filename};
pub use markdown::render_markdown;
pub use pdf::{extract_pdf_metadata, PdfMetadata};
