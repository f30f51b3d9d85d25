//! Google Gemini adapter over the `generateContent` REST endpoint.
//!
//! ARCHITECTURAL RULE: this is the only module that knows Gemini's wire
//! format. Rate limiting is decided here, from the HTTP status and the
//! structured `error.status` field, and handed to the pipeline as
//! [`ProviderError::RateLimited`].

use super::{
    AspectRatio, GenerationProvider, GroundingChunk, ImageResponse, InlineAsset, TextResponse,
    TextTools,
};
use crate::error::ProviderError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used for the eBook text.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
/// Model used for both cover images.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const PROVIDER_NAME: &str = "gemini";

/// Gemini API error statuses that mean "slow down".
const RATE_LIMIT_STATUSES: &[&str] = &["RESOURCE_EXHAUSTED", "UNAVAILABLE"];

// ── Wire types: request ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: EmptyObject,
}

#[derive(Debug, Serialize)]
struct EmptyObject {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

// ── Wire types: response ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
    /// Thinking summaries are not part of the answer.
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated answer text, `None` when the model produced none.
    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    fn grounding_chunks(&self) -> Vec<GroundingChunk> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.clone())
            .unwrap_or_default()
    }

    fn first_inline_data(&self) -> Option<&InlineData> {
        self.first_parts().iter().find_map(|p| p.inline_data.as_ref())
    }
}

// ── Provider ─────────────────────────────────────────────────────────────

/// [`GenerationProvider`] backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiProvider {
    /// Build a provider with the default models and a per-call timeout.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        })
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Point the client at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {} for model {}", status, model);
            return Err(error_from_status(status.as_u16(), &body, retry_after_secs));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        debug!(
            "Gemini call to {} returned {} candidate(s)",
            model,
            parsed.candidates.len()
        );
        Ok(parsed)
    }
}

/// Map a non-success HTTP answer onto a tagged [`ProviderError`].
fn error_from_status(status: u16, body: &str, retry_after_secs: Option<u64>) -> ProviderError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let api_status = parsed.as_ref().and_then(|e| e.error.status.as_deref());

    let rate_limited = status == 429
        || status == 503
        || api_status.is_some_and(|s| RATE_LIMIT_STATUSES.contains(&s));

    if rate_limited {
        return ProviderError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
            retry_after_secs,
        };
    }

    let message = parsed
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    ProviderError::Api { status, message }
}

fn decode_inline(data: &InlineData) -> Result<InlineAsset, ProviderError> {
    let bytes = STANDARD
        .decode(data.data.trim())
        .map_err(|e| ProviderError::InvalidResponse(format!("inline data is not base64: {e}")))?;
    let mime_type = if data.mime_type.is_empty() {
        "image/png".to_string()
    } else {
        data.mime_type.clone()
    };
    Ok(InlineAsset {
        mime_type,
        data: bytes,
    })
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate_text(
        &self,
        prompt: &str,
        tools: TextTools,
    ) -> Result<TextResponse, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: if tools.web_search_enabled() {
                vec![Tool {
                    google_search: EmptyObject {},
                }]
            } else {
                Vec::new()
            },
            generation_config: None,
        };

        let response = self.generate_content(&self.text_model, &body).await?;
        Ok(TextResponse {
            text: response.text(),
            grounding_chunks: response.grounding_chunks(),
        })
    }

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<ImageResponse, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: Vec::new(),
            generation_config: Some(WireGenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.as_str(),
                },
            }),
        };

        let response = self.generate_content(&self.image_model, &body).await?;
        let inline_asset = response.first_inline_data().map(decode_inline).transpose()?;
        Ok(ImageResponse { inline_asset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_request_enables_google_search() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hi" }],
            }],
            tools: vec![Tool {
                google_search: EmptyObject {},
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert!(json["tools"][0]["google_search"].is_object());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn image_request_carries_aspect_ratio() {
        let body = GenerateContentRequest {
            contents: vec![],
            tools: vec![],
            generation_config: Some(WireGenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: AspectRatio::Portrait3x4.as_str(),
                },
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "3:4");
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn parses_text_and_grounding() {
        let raw = r##"{
          "candidates": [{
            "content": {"parts": [
              {"text": "thinking...", "thought": true},
              {"text": "# Title\n"},
              {"text": "Body"}
            ]},
            "groundingMetadata": {"groundingChunks": [
              {"web": {"uri": "https://a.example", "title": "A"}},
              {"retrievedContext": {"uri": "x"}},
              {"web": {"uri": "https://b.example"}}
            ]}
          }]
        }"##;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text().as_deref(), Some("# Title\nBody"));
        let chunks = resp.grounding_chunks();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], GroundingChunk::web("https://a.example", "A"));
        assert!(chunks[1].web.is_none());
        assert_eq!(chunks[2], GroundingChunk::web("https://b.example", ""));
    }

    #[test]
    fn missing_candidates_mean_no_text() {
        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.text(), None);
        assert!(resp.grounding_chunks().is_empty());
        assert!(resp.first_inline_data().is_none());
    }

    #[test]
    fn decodes_inline_image() {
        let raw = format!(
            r#"{{"candidates":[{{"content":{{"parts":[
                {{"text":"here you go"}},
                {{"inlineData":{{"mimeType":"image/png","data":"{}"}}}}
            ]}}}}]}}"#,
            STANDARD.encode([1u8, 2, 3])
        );
        let resp: GenerateContentResponse = serde_json::from_str(&raw).unwrap();
        let asset = decode_inline(resp.first_inline_data().unwrap()).unwrap();
        assert_eq!(asset.mime_type, "image/png");
        assert_eq!(asset.data, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_invalid_base64() {
        let data = InlineData {
            mime_type: "image/png".into(),
            data: "%%%".into(),
        };
        assert!(matches!(
            decode_inline(&data),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn status_429_is_rate_limited() {
        let e = error_from_status(429, "", Some(30));
        assert!(matches!(
            e,
            ProviderError::RateLimited {
                retry_after_secs: Some(30),
                ..
            }
        ));
    }

    #[test]
    fn resource_exhausted_status_is_rate_limited() {
        let body = r#"{"error":{"code":400,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(error_from_status(400, body, None).is_rate_limited());
    }

    #[test]
    fn other_errors_keep_api_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        match error_from_status(400, body, None) {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_api_key() {
        let p = GeminiProvider::new("secret-key", 30).unwrap();
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("gemini-2.5-flash-image"));
    }
}
