//! Safe output file names derived from the book title.

/// Extension of the rendered document.
pub const PDF_EXTENSION: &str = "pdf";

/// Lowercase the title and replace every character outside `[a-z0-9]`
/// with `_`, one underscore per character.
///
/// Idempotent: the output only contains `[a-z0-9_]`, and `_` maps to `_`.
pub fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `"<sanitized title>.pdf"`.
pub fn pdf_file_name(title: &str) -> String {
    format!("{}.{}", sanitize_file_stem(title), PDF_EXTENSION)
}
