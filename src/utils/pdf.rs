use anyhow::{Context, Result};
use lopdf::Document;

/// Metadata read from a PDF without extracting its text
#[derive(Debug, Clone, PartialEq)]
pub struct PdfMetadata {
    pub page_count: i32,
    pub title: Option<String>,
}

/// Extract metadata from a PDF file
pub fn extract_pdf_metadata(pdf_bytes: &[u8]) -> Result<PdfMetadata> {
    let doc = Document::load_mem(pdf_bytes).context("Failed to parse PDF document")?;

    Ok(PdfMetadata {
        page_count: doc.get_pages().len() as i32,
        title: extract_pdf_title(&doc),
    })
}

/// Title from the document information dictionary, if present and UTF-8
fn extract_pdf_title(doc: &Document) -> Option<String> {
    let info_ref = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let dict = doc.get_object(info_ref).ok()?.as_dict().ok()?;
    let title_bytes = dict.get(b"Title").ok()?.as_str().ok()?;

    String::from_utf8(title_bytes.to_vec())
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    fn blank_pdf(pages: usize, title: Option<&str>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extract_valid_pdf_metadata() {
        let bytes = blank_pdf(3, Some("Cell Biology Notes"));
        let metadata = extract_pdf_metadata(&bytes).unwrap();

        assert_eq!(metadata.page_count, 3);
        assert_eq!(metadata.title.as_deref(), Some("Cell Biology Notes"));
    }

    #[test]
    fn test_missing_title_is_none() {
        let metadata = extract_pdf_metadata(&blank_pdf(1, None)).unwrap();
        assert_eq!(metadata.page_count, 1);
        assert!(metadata.title.is_none());
    }

    #[test]
    fn test_extract_invalid_pdf_fails() {
        let invalid_pdf = b"This is not a PDF";
        let result = extract_pdf_metadata(invalid_pdf);
        assert!(result.is_err());
    }
}
