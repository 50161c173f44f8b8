use once_cell::sync::Lazy;
use regex::Regex;

const MAX_FILENAME_LEN: usize = 255;

/// Characters outside the storage-safe set
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_.-]").unwrap());

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory parts are dropped, unsafe characters become `_` and leading dots
/// are removed so the result can never name a parent or hidden path.
pub fn sanitize_filename(filename: &str) -> String {
    let basename = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned = UNSAFE_CHARS.replace_all(basename.trim(), "_");
    let cleaned = cleaned.trim_start_matches('.');

    let mut result = cleaned.to_string();
    if result.len() > MAX_FILENAME_LEN {
        // Keep the extension when shortening
        let keep = MAX_FILENAME_LEN - 4;
        let ext = result[result.len() - 4..].to_string();
        result.truncate(keep);
        result.push_str(&ext);
    }
    result
}

/// Case-insensitive `.pdf` extension check
pub fn has_pdf_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}
