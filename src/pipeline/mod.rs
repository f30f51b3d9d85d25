//! The generation pipeline: three provider calls, strictly in sequence.
//!
//! ## Data Flow
//!
//! ```text
//! Idle ──▶ Text ──▶ Paced ──▶ FrontCover ──▶ Paced ──▶ BackCover ──▶ Done
//!            │                     │                       │
//!            └─────────────────────┴───────────────────────┴──▶ Failed(stage)
//! ```
//!
//! 1. [`stages::generate_text`]: body text plus citations (web search
//!    unless children's mode), cleaned by [`postprocess`]
//! 2. [`pacing`]: fixed pause so the image model is not hit in a burst
//! 3. [`stages::generate_image`]: front cover
//! 4. [`pacing`]: second pause
//! 5. [`stages::generate_image`]: back cover, prompted with the opening of
//!    the generated text
//!
//! Any failure aborts the run: later stages never start and everything
//! produced so far is dropped with the pipeline.

pub mod pacing;
pub mod postprocess;
pub mod stages;

use crate::config::GenerationConfig;
use crate::document::{count_chapter_headings, GeneratedDocument};
use crate::error::EbookError;
use crate::progress::ProgressCallback;
use crate::prompts::{back_cover_prompt, build_prompts};
use crate::provider::GenerationProvider;
use crate::request::GenerationRequest;
use pacing::{Pacer, TokioPacer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One provider call within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Text,
    FrontCover,
    BackCover,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 3] = [Stage::Text, Stage::FrontCover, Stage::BackCover];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Text => "eBook text",
            Stage::FrontCover => "front cover",
            Stage::BackCover => "back cover",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Generating(Stage),
    /// Pausing before `next` starts.
    Paced { next: Stage },
    Done,
    Failed(Stage),
}

/// Wall-clock time spent per stage and in pauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub text: Duration,
    pub front_cover: Duration,
    pub back_cover: Duration,
    pub pacing: Duration,
}

impl StageTimings {
    fn record(&mut self, stage: Stage, elapsed: Duration) {
        match stage {
            Stage::Text => self.text = elapsed,
            Stage::FrontCover => self.front_cover = elapsed,
            Stage::BackCover => self.back_cover = elapsed,
        }
    }
}

/// Sequential state machine driving one generation run.
///
/// A pipeline runs once; build a new one per request.
pub struct GenerationPipeline {
    provider: Arc<dyn GenerationProvider>,
    pacer: Arc<dyn Pacer>,
    pacing: Duration,
    back_cover_context_chars: usize,
    progress: Option<ProgressCallback>,
    state: PipelineState,
    timings: StageTimings,
}

impl GenerationPipeline {
    /// Create a pipeline for `provider`, taking pacing and callbacks from `config`.
    pub fn new(provider: Arc<dyn GenerationProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            pacer: config
                .pacer
                .clone()
                .unwrap_or_else(|| Arc::new(TokioPacer)),
            pacing: config.pacing,
            back_cover_context_chars: config.back_cover_context_chars,
            progress: config.progress_callback.clone(),
            state: PipelineState::Idle,
            timings: StageTimings::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn timings(&self) -> StageTimings {
        self.timings
    }

    /// Run all three stages and assemble the document.
    ///
    /// # Errors
    /// The first stage failure, classified; see [`stages::classify`].
    /// Calling `run` a second time is an [`EbookError::Internal`].
    pub async fn run(
        &mut self,
        request: &GenerationRequest,
    ) -> Result<GeneratedDocument, EbookError> {
        if self.state != PipelineState::Idle {
            return Err(EbookError::Internal(format!(
                "pipeline already used (state {:?})",
                self.state
            )));
        }
        request.validate()?;

        let provider = Arc::clone(&self.provider);
        let prompts = build_prompts(request);
        if let Some(ref cb) = self.progress {
            cb.on_generation_start(Stage::ALL.len());
        }
        info!(
            "Generating eBook on \"{}\" via {} ({} chapters, children's mode: {})",
            request.topic.trim(),
            provider.name(),
            request.chapters,
            request.children_mode
        );

        // ── Stage 1: text ────────────────────────────────────────────────
        let (body, sources) = self
            .run_stage(
                Stage::Text,
                stages::generate_text(provider.as_ref(), &prompts.text, request.children_mode),
                |(body, _)| body.len(),
            )
            .await?;

        let headings = count_chapter_headings(&body);
        if headings != usize::from(request.chapters) {
            warn!(
                "Requested {} chapters but the text has {} chapter headings",
                request.chapters, headings
            );
        }

        // ── Stage 2: front cover ─────────────────────────────────────────
        self.pace(Stage::FrontCover).await;
        let front_cover = self
            .run_stage(
                Stage::FrontCover,
                stages::generate_image(provider.as_ref(), &prompts.front_cover, Stage::FrontCover),
                |img| img.bytes.len(),
            )
            .await?;

        // ── Stage 3: back cover ──────────────────────────────────────────
        self.pace(Stage::BackCover).await;
        let back_prompt = back_cover_prompt(request, &body, self.back_cover_context_chars);
        let back_cover = self
            .run_stage(
                Stage::BackCover,
                stages::generate_image(provider.as_ref(), &back_prompt, Stage::BackCover),
                |img| img.bytes.len(),
            )
            .await?;

        self.transition(PipelineState::Done);
        Ok(GeneratedDocument {
            body,
            sources,
            front_cover,
            back_cover,
        })
    }

    async fn run_stage<T, F>(
        &mut self,
        stage: Stage,
        work: F,
        output_len: impl Fn(&T) -> usize,
    ) -> Result<T, EbookError>
    where
        F: Future<Output = Result<T, EbookError>>,
    {
        self.transition(PipelineState::Generating(stage));
        if let Some(ref cb) = self.progress {
            cb.on_stage_start(stage);
        }

        let start = Instant::now();
        let result = work.await;
        let elapsed = start.elapsed();
        self.timings.record(stage, elapsed);

        match result {
            Ok(output) => {
                let len = output_len(&output);
                info!("Generated {} in {}ms", stage, elapsed.as_millis());
                if let Some(ref cb) = self.progress {
                    cb.on_stage_complete(stage, len);
                }
                Ok(output)
            }
            Err(e) => {
                warn!("Stage {} failed after {}ms: {}", stage, elapsed.as_millis(), e);
                self.transition(PipelineState::Failed(stage));
                if let Some(ref cb) = self.progress {
                    cb.on_stage_error(stage, &e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn pace(&mut self, next: Stage) {
        self.transition(PipelineState::Paced { next });
        if let Some(ref cb) = self.progress {
            cb.on_pacing(next, self.pacing);
        }
        let start = Instant::now();
        self.pacer.pause(self.pacing).await;
        self.timings.pacing += start.elapsed();
    }

    fn transition(&mut self, to: PipelineState) {
        debug!("Pipeline: {:?} -> {:?}", self.state, to);
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::{
        AspectRatio, ImageResponse, InlineAsset, TextResponse, TextTools,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl Log {
        fn push(&self, s: impl Into<String>) {
            self.0.lock().unwrap().push(s.into());
        }
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct LoggingProvider {
        log: Arc<Log>,
        fail_images_after: Option<usize>,
        images: Mutex<usize>,
    }

    #[async_trait]
    impl GenerationProvider for LoggingProvider {
        fn name(&self) -> &str {
            "logging"
        }

        async fn generate_text(
            &self,
            _prompt: &str,
            _tools: TextTools,
        ) -> Result<TextResponse, ProviderError> {
            self.log.push("text");
            Ok(TextResponse {
                text: Some("# Book\n## Chapter 1\nText".into()),
                grounding_chunks: vec![],
            })
        }

        async fn generate_image(
            &self,
            prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> Result<ImageResponse, ProviderError> {
            let mut n = self.images.lock().unwrap();
            *n += 1;
            self.log.push(if prompt.starts_with("Back") {
                "back"
            } else {
                "front"
            });
            if self.fail_images_after.is_some_and(|limit| *n > limit) {
                return Err(ProviderError::Transport("reset".into()));
            }
            Ok(ImageResponse {
                inline_asset: Some(InlineAsset {
                    mime_type: "image/png".into(),
                    data: vec![7; 4],
                }),
            })
        }
    }

    struct LoggingPacer(Arc<Log>);

    #[async_trait]
    impl Pacer for LoggingPacer {
        async fn pause(&self, duration: Duration) {
            self.0.push(format!("pause {}ms", duration.as_millis()));
        }
    }

    fn pipeline(fail_images_after: Option<usize>) -> (GenerationPipeline, Arc<Log>) {
        let log = Arc::new(Log::default());
        let provider = Arc::new(LoggingProvider {
            log: Arc::clone(&log),
            fail_images_after,
            images: Mutex::new(0),
        });
        let config = GenerationConfig::builder()
            .pacer(Arc::new(LoggingPacer(Arc::clone(&log))))
            .build()
            .unwrap();
        (GenerationPipeline::new(provider, &config), log)
    }

    #[test]
    fn success_runs_stages_in_order_with_two_pauses() {
        let (mut p, log) = pipeline(None);
        let doc = tokio_test::block_on(p.run(&GenerationRequest::new("Oceans").chapters(1))).unwrap();
        assert_eq!(
            log.entries(),
            vec!["text", "pause 2000ms", "front", "pause 2000ms", "back"]
        );
        assert_eq!(p.state(), PipelineState::Done);
        assert_eq!(doc.front_cover.bytes, vec![7; 4]);
    }

    #[test]
    fn failure_stops_the_run() {
        let (mut p, log) = pipeline(Some(1));
        let err = tokio_test::block_on(p.run(&GenerationRequest::new("Oceans"))).unwrap_err();
        assert!(matches!(
            err,
            EbookError::GenerationFailed {
                stage: Stage::BackCover,
                ..
            }
        ));
        assert_eq!(p.state(), PipelineState::Failed(Stage::BackCover));
        assert_eq!(log.entries().last().map(String::as_str), Some("back"));
    }

    #[test]
    fn pipeline_runs_only_once() {
        let (mut p, _log) = pipeline(None);
        let req = GenerationRequest::new("Oceans");
        tokio_test::block_on(p.run(&req)).unwrap();
        let err = tokio_test::block_on(p.run(&req)).unwrap_err();
        assert!(matches!(err, EbookError::Internal(_)));
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::Text.to_string(), "eBook text");
        assert_eq!(Stage::FrontCover.to_string(), "front cover");
        assert_eq!(Stage::BackCover.to_string(), "back cover");
    }
}
