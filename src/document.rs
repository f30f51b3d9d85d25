//! Output types: the generated document, the rendered PDF and run stats.

use crate::sources::Source;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded cover image as returned by the image stage.
#[derive(Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for CoverImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Everything the generation pipeline produced.
///
/// Only ever constructed after all three stages succeeded.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Markdown-like text; the first line is the title line.
    pub body: String,
    pub sources: Vec<Source>,
    pub front_cover: CoverImage,
    pub back_cover: CoverImage,
}

/// Derive the book title from generated text.
///
/// Takes the first line, removes every `#`, trims; falls back to the
/// trimmed `topic` when nothing is left.
pub fn derive_title(body: &str, topic: &str) -> String {
    let first = body.lines().next().unwrap_or("");
    let title = first.replace('#', "");
    let title = title.trim();
    if title.is_empty() {
        topic.trim().to_string()
    } else {
        title.to_string()
    }
}

/// Number of level-2 (`## `) headings after the title line.
///
/// Chapter headings are what the text prompt asks for, but the model is
/// free to return more or fewer, so this is only reported, never enforced.
pub fn count_chapter_headings(body: &str) -> usize {
    body.lines()
        .skip(1)
        .filter(|l| l.trim().starts_with("## "))
        .count()
}

/// A finished, print-ready PDF.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedEbook {
    pub bytes: Vec<u8>,
    /// Sanitised title plus `.pdf`.
    pub file_name: String,
    /// Physical pages, both covers included.
    pub page_count: usize,
}

impl fmt::Debug for RenderedEbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedEbook")
            .field("file_name", &self.file_name)
            .field("page_count", &self.page_count)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Timing and shape of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub text_duration_ms: u64,
    pub front_cover_duration_ms: u64,
    pub back_cover_duration_ms: u64,
    /// Time spent in pacing pauses between stages.
    pub pacing_duration_ms: u64,
    pub layout_duration_ms: u64,
    pub total_duration_ms: u64,
    pub requested_chapters: u8,
    /// `## ` headings actually present in the body.
    pub chapter_headings: usize,
    pub source_count: usize,
    pub page_count: usize,
}

/// Result of [`crate::generate::generate_ebook`].
#[derive(Debug, Clone)]
pub struct EbookOutput {
    pub title: String,
    pub document: GeneratedDocument,
    pub pdf: RenderedEbook,
    pub stats: GenerationStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_strips_markers_and_trims() {
        assert_eq!(derive_title("# The Deep Sea \nbody", "Oceans"), "The Deep Sea");
        assert_eq!(derive_title("## Sub#title", "Oceans"), "Subtitle");
    }

    #[test]
    fn title_falls_back_to_topic() {
        assert_eq!(derive_title("#  \nbody", " Oceans "), "Oceans");
        assert_eq!(derive_title("", "Oceans"), "Oceans");
    }

    #[test]
    fn counts_only_level_two_headings_after_title() {
        let body = "## Not counted title\n## One\ntext\n### Sub\n  ## Two\n# Top\n## Three";
        assert_eq!(count_chapter_headings(body), 3);
    }

    #[test]
    fn debug_hides_image_bytes() {
        let img = CoverImage {
            mime_type: "image/png".into(),
            bytes: vec![0; 1024],
        };
        let dbg = format!("{img:?}");
        assert!(dbg.contains("<1024 bytes>"));
    }
}
