//! The generation capability the pipeline drives.
//!
//! The pipeline never talks HTTP itself. It calls a [`GenerationProvider`],
//! which answers text and image requests and reports failures as tagged
//! [`ProviderError`]s. [`gemini::GeminiProvider`] is the production
//! implementation; tests plug in scripted providers.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod gemini;

pub use gemini::GeminiProvider;

/// Tooling the text model may use while writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTools {
    /// No tools: the model writes from its own knowledge.
    None,
    /// Web search grounding; the response may carry citation chunks.
    WebSearch,
}

impl TextTools {
    pub fn web_search_enabled(self) -> bool {
        matches!(self, TextTools::WebSearch)
    }
}

/// Requested image shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// 3 wide by 4 tall; used for both covers.
    Portrait3x4,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Portrait3x4 => "3:4",
        }
    }
}

/// A web page backing part of the generated text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebReference {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// One grounding fragment as returned by the provider.
///
/// Providers return heterogeneous chunks; only those with a `web`
/// reference become citations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebReference>,
}

impl GroundingChunk {
    pub fn web(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            web: Some(WebReference {
                uri: uri.into(),
                title: title.into(),
            }),
        }
    }
}

/// Answer to a text request.
#[derive(Debug, Clone, Default)]
pub struct TextResponse {
    pub text: Option<String>,
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// A binary asset returned inline in a response, already base64-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAsset {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Answer to an image request.
#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub inline_asset: Option<InlineAsset>,
}

/// An external content-generation service.
///
/// Implementations must be `Send + Sync`; the pipeline holds them behind an
/// `Arc` and calls them strictly one request at a time.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short provider name for logs and error messages.
    fn name(&self) -> &str;

    async fn generate_text(
        &self,
        prompt: &str,
        tools: TextTools,
    ) -> Result<TextResponse, ProviderError>;

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<ImageResponse, ProviderError>;
}
