//! Citation extraction from grounding metadata.

use crate::provider::GroundingChunk;
use serde::{Deserialize, Serialize};

/// A cited web page, in the relevance order the provider returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    /// May be empty; [`Source::label`] then falls back to the uri.
    #[serde(default)]
    pub title: String,
}

impl Source {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }

    /// Text shown above the link: the title, or the uri when untitled.
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.uri
        } else {
            &self.title
        }
    }
}

/// Keep the chunks that reference a web page, preserving their order.
///
/// Chunks without a web reference (or with an empty uri) are dropped
/// silently.
pub fn extract_sources(chunks: &[GroundingChunk]) -> Vec<Source> {
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter(|web| !web.uri.trim().is_empty())
        .map(|web| Source::new(web.uri.trim(), web.title.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_web_chunks_in_order() {
        let chunks = vec![
            GroundingChunk::web("https://b.example", "B"),
            GroundingChunk::default(),
            GroundingChunk::web("https://a.example", ""),
            GroundingChunk::web("", "no uri"),
        ];
        let sources = extract_sources(&chunks);
        assert_eq!(
            sources,
            vec![
                Source::new("https://b.example", "B"),
                Source::new("https://a.example", ""),
            ]
        );
    }

    #[test]
    fn empty_input_gives_no_sources() {
        assert!(extract_sources(&[]).is_empty());
    }

    #[test]
    fn label_falls_back_to_uri() {
        assert_eq!(Source::new("https://x.example", "").label(), "https://x.example");
        assert_eq!(Source::new("https://x.example", "  ").label(), "https://x.example");
        assert_eq!(Source::new("https://x.example", "X").label(), "X");
    }
}
