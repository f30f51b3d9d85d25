//! The two kinds of provider call the pipeline makes.
//!
//! Each function performs exactly one provider request and turns the result
//! into either stage output or a classified [`EbookError`]. No retries: a
//! failure here ends the run.

use super::postprocess::clean_body;
use super::Stage;
use crate::document::CoverImage;
use crate::error::{EbookError, ProviderError};
use crate::provider::{AspectRatio, GenerationProvider, TextTools};
use crate::sources::{extract_sources, Source};
use tracing::{debug, warn};

/// Map a provider failure onto the caller-facing taxonomy.
///
/// Only the variant is inspected; message text is carried, never parsed.
pub fn classify(stage: Stage, err: ProviderError) -> EbookError {
    match err {
        ProviderError::RateLimited {
            retry_after_secs, ..
        } => EbookError::RateLimited {
            stage,
            retry_after_secs,
        },
        other => EbookError::GenerationFailed {
            stage,
            message: other.to_string(),
        },
    }
}

/// Generate the body text and its citations.
///
/// Web search is requested unless `children_mode` is set; in that mode any
/// grounding the provider still returns is discarded so the source list is
/// always empty.
pub async fn generate_text(
    provider: &dyn GenerationProvider,
    prompt: &str,
    children_mode: bool,
) -> Result<(String, Vec<Source>), EbookError> {
    let tools = if children_mode {
        TextTools::None
    } else {
        TextTools::WebSearch
    };

    let response = provider
        .generate_text(prompt, tools)
        .await
        .map_err(|e| classify(Stage::Text, e))?;

    let body = response
        .text
        .as_deref()
        .map(clean_body)
        .filter(|t| !t.trim().is_empty())
        .ok_or(EbookError::EmptyContent)?;

    let sources = if children_mode {
        if !response.grounding_chunks.is_empty() {
            warn!(
                "Ignoring {} grounding chunk(s) returned for a children's book",
                response.grounding_chunks.len()
            );
        }
        Vec::new()
    } else {
        extract_sources(&response.grounding_chunks)
    };

    debug!(
        "Text stage: {} chars, {} source(s) from {} chunk(s)",
        body.chars().count(),
        sources.len(),
        response.grounding_chunks.len()
    );
    Ok((body, sources))
}

/// Generate one 3:4 cover image.
pub async fn generate_image(
    provider: &dyn GenerationProvider,
    prompt: &str,
    stage: Stage,
) -> Result<CoverImage, EbookError> {
    let response = provider
        .generate_image(prompt, AspectRatio::Portrait3x4)
        .await
        .map_err(|e| classify(stage, e))?;

    let asset = response
        .inline_asset
        .filter(|a| !a.data.is_empty())
        .ok_or(EbookError::NoImageReturned { stage })?;

    debug!(
        "{} stage: {} bytes of {}",
        stage,
        asset.data.len(),
        asset.mime_type
    );
    Ok(CoverImage {
        mime_type: asset.mime_type,
        bytes: asset.data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{GroundingChunk, ImageResponse, InlineAsset, TextResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every call with the same canned responses and records tools.
    struct CannedProvider {
        text: Result<TextResponse, ProviderError>,
        image: Result<ImageResponse, ProviderError>,
        tools_seen: Mutex<Vec<TextTools>>,
    }

    impl CannedProvider {
        fn new(
            text: Result<TextResponse, ProviderError>,
            image: Result<ImageResponse, ProviderError>,
        ) -> Self {
            Self {
                text,
                image,
                tools_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate_text(
            &self,
            _prompt: &str,
            tools: TextTools,
        ) -> Result<TextResponse, ProviderError> {
            self.tools_seen.lock().unwrap().push(tools);
            self.text.clone()
        }

        async fn generate_image(
            &self,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> Result<ImageResponse, ProviderError> {
            self.image.clone()
        }
    }

    fn grounded_text() -> TextResponse {
        TextResponse {
            text: Some("# Title\nBody".into()),
            grounding_chunks: vec![
                GroundingChunk::web("https://a.example", "A"),
                GroundingChunk::default(),
            ],
        }
    }

    fn png_asset() -> ImageResponse {
        ImageResponse {
            inline_asset: Some(InlineAsset {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3],
            }),
        }
    }

    #[test]
    fn standard_text_uses_search_and_keeps_sources() {
        let p = CannedProvider::new(Ok(grounded_text()), Ok(png_asset()));
        let (body, sources) =
            tokio_test::block_on(generate_text(&p, "prompt", false)).unwrap();
        assert_eq!(body, "# Title\nBody");
        assert_eq!(sources, vec![Source::new("https://a.example", "A")]);
        assert_eq!(*p.tools_seen.lock().unwrap(), vec![TextTools::WebSearch]);
    }

    #[test]
    fn children_text_disables_search_and_drops_sources() {
        let p = CannedProvider::new(Ok(grounded_text()), Ok(png_asset()));
        let (_, sources) = tokio_test::block_on(generate_text(&p, "prompt", true)).unwrap();
        assert!(sources.is_empty());
        assert_eq!(*p.tools_seen.lock().unwrap(), vec![TextTools::None]);
    }

    #[test]
    fn missing_or_blank_text_is_empty_content() {
        for text in [None, Some("  \n ".to_string())] {
            let p = CannedProvider::new(
                Ok(TextResponse {
                    text,
                    grounding_chunks: vec![],
                }),
                Ok(png_asset()),
            );
            let err = tokio_test::block_on(generate_text(&p, "prompt", false)).unwrap_err();
            assert!(matches!(err, EbookError::EmptyContent), "got {err:?}");
        }
    }

    #[test]
    fn rate_limit_is_classified_per_stage() {
        let p = CannedProvider::new(
            Ok(grounded_text()),
            Err(ProviderError::RateLimited {
                provider: "canned".into(),
                retry_after_secs: Some(5),
            }),
        );
        let err =
            tokio_test::block_on(generate_image(&p, "prompt", Stage::FrontCover)).unwrap_err();
        assert!(matches!(
            err,
            EbookError::RateLimited {
                stage: Stage::FrontCover,
                retry_after_secs: Some(5)
            }
        ));
    }

    #[test]
    fn other_errors_become_generation_failed() {
        let p = CannedProvider::new(
            Err(ProviderError::Api {
                status: 500,
                message: "boom".into(),
            }),
            Ok(png_asset()),
        );
        let err = tokio_test::block_on(generate_text(&p, "prompt", false)).unwrap_err();
        match err {
            EbookError::GenerationFailed { stage, message } => {
                assert_eq!(stage, Stage::Text);
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_or_empty_asset_is_no_image() {
        for inline_asset in [
            None,
            Some(InlineAsset {
                mime_type: "image/png".into(),
                data: vec![],
            }),
        ] {
            let p = CannedProvider::new(Ok(grounded_text()), Ok(ImageResponse { inline_asset }));
            let err =
                tokio_test::block_on(generate_image(&p, "prompt", Stage::BackCover)).unwrap_err();
            assert!(matches!(
                err,
                EbookError::NoImageReturned {
                    stage: Stage::BackCover
                }
            ));
        }
    }

    #[test]
    fn image_bytes_are_passed_through() {
        let p = CannedProvider::new(Ok(grounded_text()), Ok(png_asset()));
        let img = tokio_test::block_on(generate_image(&p, "prompt", Stage::FrontCover)).unwrap();
        assert_eq!(img.bytes, vec![1, 2, 3]);
        assert_eq!(img.mime_type, "image/png");
    }
}
