//! Error types for the edgequake-ebook library.
//!
//! Two error types reflect the two sides of the provider boundary:
//!
//! * [`ProviderError`]: what a [`crate::provider::GenerationProvider`]
//!   reports. The adapter tags rate limiting explicitly, so nothing
//!   downstream has to search error messages for "429" or
//!   "RESOURCE_EXHAUSTED".
//!
//! * [`EbookError`]: **fatal**, caller-facing. Every pipeline or layout
//!   failure ends the whole run: there is no partial eBook and no automatic
//!   retry. The caller sees exactly one error and resubmits the request.

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-ebook library.
#[derive(Debug, Error)]
pub enum EbookError {
    // ── Generation errors ─────────────────────────────────────────────────
    /// The text stage finished but the provider returned no text.
    #[error("The generation service returned no content for the eBook text.")]
    EmptyContent,

    /// An image stage finished but the response carried no inline image.
    #[error("No image was generated for the {stage}.")]
    NoImageReturned { stage: Stage },

    /// The provider signalled quota exhaustion or overload.
    #[error("API request limit reached while generating the {stage}. Please wait a minute and try again.")]
    RateLimited {
        stage: Stage,
        retry_after_secs: Option<u64>,
    },

    /// Any other provider failure, with the provider's own message.
    #[error("Failed to generate the {stage}: {message}")]
    GenerationFailed { stage: Stage, message: String },

    // ── Layout errors ─────────────────────────────────────────────────────
    /// Drawing, image decoding or PDF serialisation failed.
    #[error("Failed to lay out the eBook: {0}")]
    LayoutFailed(String),

    // ── Input / config errors ─────────────────────────────────────────────
    /// The request violates a field constraint (empty topic, chapters out of range).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No provider could be constructed (missing API key etc.).
    #[error("Generation provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EbookError {
    /// `true` when the run failed because the provider asked us to back off.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, EbookError::RateLimited { .. })
    }

    /// The pipeline stage the error belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            EbookError::EmptyContent => Some(Stage::Text),
            EbookError::NoImageReturned { stage }
            | EbookError::RateLimited { stage, .. }
            | EbookError::GenerationFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Failure reported by a generation provider.
///
/// Adapters map their transport's status codes onto these variants; the
/// pipeline classifies only on the variant, never on message text.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// HTTP 429, quota exhausted, or the model is overloaded.
    #[error("rate limited by provider '{provider}'")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The API answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}
