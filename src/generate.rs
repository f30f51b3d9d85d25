//! Caller-facing entry points.
//!
//! [`generate_document`] runs only the generation pipeline;
//! [`generate_ebook`] adds title derivation and layout; [`generate_to_file`]
//! also writes the PDF. Every entry point either returns a complete result
//! or exactly one error.

use crate::config::GenerationConfig;
use crate::document::{
    count_chapter_headings, derive_title, EbookOutput, GeneratedDocument, GenerationStats,
};
use crate::error::EbookError;
use crate::layout::LayoutEngine;
use crate::pipeline::GenerationPipeline;
use crate::provider::{GeminiProvider, GenerationProvider};
use crate::request::GenerationRequest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Environment variables checked for a Gemini API key, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Run the three generation stages and return the raw document.
///
/// # Errors
/// The first failing stage's error; see [`EbookError`].
pub async fn generate_document(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, EbookError> {
    let provider = resolve_provider(config)?;
    GenerationPipeline::new(provider, config).run(request).await
}

/// Generate a document and lay it out as a PDF.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use edgequake_ebook::{generate_ebook, GenerationConfig, GenerationRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = GenerationRequest::new("Oceans").chapters(3);
/// let output = generate_ebook(&request, &GenerationConfig::default()).await?;
/// std::fs::write(&output.pdf.file_name, &output.pdf.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_ebook(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<EbookOutput, EbookError> {
    let total_start = Instant::now();
    let provider = resolve_provider(config)?;

    let mut pipeline = GenerationPipeline::new(provider, config);
    let document = pipeline.run(request).await?;
    let timings = pipeline.timings();

    let title = derive_title(&document.body, &request.topic);
    debug!("Derived title: {}", title);

    // Layout is CPU-bound; keep it off the async workers.
    let layout_start = Instant::now();
    let engine = LayoutEngine::new(config.layout.clone());
    let (document, pdf) = {
        let title = title.clone();
        tokio::task::spawn_blocking(move || {
            let pdf = engine.render(&document, &title);
            (document, pdf)
        })
        .await
        .map_err(|e| EbookError::Internal(format!("layout task failed: {e}")))?
    };
    let pdf = pdf?;
    let layout_duration_ms = layout_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_layout_complete(pdf.page_count);
    }

    let stats = GenerationStats {
        text_duration_ms: timings.text.as_millis() as u64,
        front_cover_duration_ms: timings.front_cover.as_millis() as u64,
        back_cover_duration_ms: timings.back_cover.as_millis() as u64,
        pacing_duration_ms: timings.pacing.as_millis() as u64,
        layout_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        requested_chapters: request.chapters,
        chapter_headings: count_chapter_headings(&document.body),
        source_count: document.sources.len(),
        page_count: pdf.page_count,
    };

    info!(
        "eBook complete: \"{}\", {} pages, {} sources, {}ms total",
        title, stats.page_count, stats.source_count, stats.total_duration_ms
    );

    Ok(EbookOutput {
        title,
        document,
        pdf,
        stats,
    })
}

/// Generate an eBook and write it into `dir` under its sanitised file name.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated PDF behind. Returns the final path with the output.
pub async fn generate_to_file(
    request: &GenerationRequest,
    dir: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<(PathBuf, EbookOutput), EbookError> {
    let output = generate_ebook(request, config).await?;
    let dir = dir.as_ref();
    let path = dir.join(&output.pdf.file_name);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| EbookError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf.bytes)
        .await
        .map_err(|e| EbookError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| EbookError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    info!("Wrote {}", path.display());
    Ok((path, output))
}

/// Synchronous wrapper around [`generate_ebook`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_ebook_sync(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<EbookOutput, EbookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| EbookError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_ebook(request, config))
}

/// Resolve the generation provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **API key in the config** for the built-in Gemini adapter.
/// 3. **Environment**: the first non-empty variable of [`API_KEY_ENV_VARS`].
///
/// Model overrides from the config apply to the Gemini adapter only.
pub fn resolve_provider(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenerationProvider>, EbookError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            API_KEY_ENV_VARS
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|k| !k.trim().is_empty())
        })
        .ok_or_else(|| EbookError::ProviderNotConfigured {
            provider: "gemini".to_string(),
            hint: format!(
                "No API key found. Pass --api-key or set one of {}.",
                API_KEY_ENV_VARS.join(", ")
            ),
        })?;

    let mut gemini = GeminiProvider::new(key, config.api_timeout_secs).map_err(|e| {
        EbookError::ProviderNotConfigured {
            provider: "gemini".to_string(),
            hint: e.to_string(),
        }
    })?;
    if let Some(ref model) = config.text_model {
        gemini = gemini.with_text_model(model);
    }
    if let Some(ref model) = config.image_model {
        gemini = gemini.with_image_model(model);
    }
    debug!(
        "Using Gemini provider (text: {}, image: {})",
        gemini.text_model(),
        gemini.image_model()
    );
    Ok(Arc::new(gemini))
}
