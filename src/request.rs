//! The user's order: what eBook to generate.
//!
//! A [`GenerationRequest`] is immutable once handed to the pipeline. The tone
//! and cover-style tags accept both the English names used by the CLI and
//! the Portuguese tags of the web form, so saved requests from either keep
//! working.

use crate::error::EbookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum and maximum number of chapters a request may ask for.
pub const CHAPTER_RANGE: std::ops::RangeInclusive<u8> = 1..=20;

/// Languages offered by default: `(code, display name)`.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("pt", "Portuguese"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
];

/// Display name for a language code; unknown codes pass through verbatim.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Everything the pipeline needs to write one eBook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    /// Extra theme woven through the book. Empty strings count as absent.
    #[serde(default)]
    pub secondary_topic: Option<String>,
    /// ISO language code, e.g. `"en"`.
    pub language: String,
    pub chapters: u8,
    /// Ignored in children's mode.
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub cover_style: CoverStyle,
    #[serde(default)]
    pub children_mode: bool,
}

impl GenerationRequest {
    /// A standard-mode request in English with five chapters.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            secondary_topic: None,
            language: "en".to_string(),
            chapters: 5,
            tone: Tone::default(),
            cover_style: CoverStyle::default(),
            children_mode: false,
        }
    }

    pub fn secondary_topic(mut self, topic: impl Into<String>) -> Self {
        self.secondary_topic = Some(topic.into());
        self
    }

    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.language = code.into();
        self
    }

    pub fn chapters(mut self, n: u8) -> Self {
        self.chapters = n;
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn cover_style(mut self, style: CoverStyle) -> Self {
        self.cover_style = style;
        self
    }

    pub fn children_mode(mut self, on: bool) -> Self {
        self.children_mode = on;
        self
    }

    /// The secondary topic, trimmed, or `None` when blank.
    pub fn theme(&self) -> Option<&str> {
        self.secondary_topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// `"topic"` or `"topic with the theme of theme"`.
    pub fn full_topic(&self) -> String {
        let topic = self.topic.trim();
        match self.theme() {
            Some(theme) => format!("{topic} with the theme of {theme}"),
            None => topic.to_string(),
        }
    }

    /// Check the field constraints before any provider call is made.
    pub fn validate(&self) -> Result<(), EbookError> {
        if self.topic.trim().is_empty() {
            return Err(EbookError::InvalidRequest("topic must not be empty".into()));
        }
        if !CHAPTER_RANGE.contains(&self.chapters) {
            return Err(EbookError::InvalidRequest(format!(
                "chapter count must be {}–{}, got {}",
                CHAPTER_RANGE.start(),
                CHAPTER_RANGE.end(),
                self.chapters
            )));
        }
        if self.language.trim().is_empty() {
            return Err(EbookError::InvalidRequest(
                "language code must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Writing tone for standard-mode books.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Tone {
    /// Rendered as "professional and educational".
    #[default]
    Default,
    Professional,
    Casual,
    Academic,
    Playful,
    /// Any other tone, passed to the model verbatim.
    Custom(String),
}

impl Tone {
    pub fn as_str(&self) -> &str {
        match self {
            Tone::Default => "default",
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Academic => "academic",
            Tone::Playful => "playful",
            Tone::Custom(s) => s,
        }
    }

    /// The phrase substituted into the text prompt.
    pub fn prompt_phrase(&self) -> &str {
        match self {
            Tone::Default => "professional and educational",
            other => other.as_str(),
        }
    }
}

impl FromStr for Tone {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Ok(match tag.to_lowercase().as_str() {
            "" | "default" | "padrão" | "padrao" => Tone::Default,
            "professional" | "profissional" => Tone::Professional,
            "casual" => Tone::Casual,
            "academic" | "acadêmico" | "academico" => Tone::Academic,
            "playful" | "fun" | "divertido" => Tone::Playful,
            _ => Tone::Custom(tag.to_string()),
        })
    }
}

impl From<String> for Tone {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(tone) => tone,
            Err(never) => match never {},
        }
    }
}

impl From<Tone> for String {
    fn from(t: Tone) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Art direction for both cover images in standard mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CoverStyle {
    /// Illustrate the story's own theme.
    #[default]
    StoryTheme,
    Minimalist,
    Simple,
    Custom(String),
}

impl CoverStyle {
    pub fn as_str(&self) -> &str {
        match self {
            CoverStyle::StoryTheme => "story-theme",
            CoverStyle::Minimalist => "minimalist",
            CoverStyle::Simple => "simple",
            CoverStyle::Custom(s) => s,
        }
    }

    /// The words interpolated into the image prompt.
    pub fn prompt_phrase(&self) -> &str {
        match self {
            CoverStyle::StoryTheme => "story theme",
            CoverStyle::Minimalist => "minimalist",
            CoverStyle::Simple => "simple",
            CoverStyle::Custom(s) => s,
        }
    }
}

impl FromStr for CoverStyle {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Ok(match tag.to_lowercase().as_str() {
            "" | "story-theme" | "story theme" | "tema da história" | "tema da historia" => {
                CoverStyle::StoryTheme
            }
            "minimalist" | "minimalista" => CoverStyle::Minimalist,
            "simple" | "simples" => CoverStyle::Simple,
            _ => CoverStyle::Custom(tag.to_string()),
        })
    }
}

impl From<String> for CoverStyle {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(style) => style,
            Err(never) => match never {},
        }
    }
}

impl From<CoverStyle> for String {
    fn from(c: CoverStyle) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for CoverStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_topic_with_and_without_theme() {
        let req = GenerationRequest::new("Oceans");
        assert_eq!(req.full_topic(), "Oceans");

        let req = req.secondary_topic("  pirates ");
        assert_eq!(req.full_topic(), "Oceans with the theme of pirates");

        let req = GenerationRequest::new("Oceans").secondary_topic("   ");
        assert_eq!(req.theme(), None);
        assert_eq!(req.full_topic(), "Oceans");
    }

    #[test]
    fn validate_rejects_empty_topic_and_bad_chapter_counts() {
        assert!(GenerationRequest::new("  ").validate().is_err());
        assert!(GenerationRequest::new("x").chapters(0).validate().is_err());
        assert!(GenerationRequest::new("x").chapters(21).validate().is_err());
        assert!(GenerationRequest::new("x").chapters(1).validate().is_ok());
        assert!(GenerationRequest::new("x").chapters(20).validate().is_ok());
    }

    #[test]
    fn tone_accepts_portuguese_tags() {
        assert_eq!("padrão".parse::<Tone>().unwrap(), Tone::Default);
        assert_eq!("Acadêmico".parse::<Tone>().unwrap(), Tone::Academic);
        assert_eq!("divertido".parse::<Tone>().unwrap(), Tone::Playful);
        assert_eq!(
            "whimsical".parse::<Tone>().unwrap(),
            Tone::Custom("whimsical".into())
        );
    }

    #[test]
    fn tone_prompt_phrase_only_replaces_default() {
        assert_eq!(Tone::Default.prompt_phrase(), "professional and educational");
        assert_eq!(Tone::Casual.prompt_phrase(), "casual");
        assert_eq!(Tone::Custom("noir".into()).prompt_phrase(), "noir");
    }

    #[test]
    fn cover_style_accepts_portuguese_tags() {
        assert_eq!(
            "tema da história".parse::<CoverStyle>().unwrap(),
            CoverStyle::StoryTheme
        );
        assert_eq!(
            "minimalista".parse::<CoverStyle>().unwrap(),
            CoverStyle::Minimalist
        );
    }

    #[test]
    fn language_names() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("PT"), "Portuguese");
        assert_eq!(language_name("it"), "it");
    }

    #[test]
    fn request_roundtrips_through_json_tags() {
        let req = GenerationRequest::new("Oceans").tone(Tone::Academic);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"tone\":\"academic\""), "got: {json}");
        let back: GenerationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }
}
