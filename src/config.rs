//! Configuration types for eBook generation.
//!
//! All run behaviour is controlled through [`GenerationConfig`], built via
//! its [`GenerationConfigBuilder`]. The request says *what* book to write;
//! the config says *how* to talk to the provider and lay out the result.

use crate::error::EbookError;
use crate::layout::LayoutOptions;
use crate::pipeline::pacing::Pacer;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_BACK_COVER_CONTEXT_CHARS;
use crate::provider::GenerationProvider;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Pause between two provider calls.
pub const DEFAULT_PACING: Duration = Duration::from_secs(2);

/// Configuration for an eBook generation run.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_ebook::GenerationConfig;
/// use std::time::Duration;
///
/// let config = GenerationConfig::builder()
///     .pacing(Duration::from_secs(3))
///     .text_model("gemini-2.5-pro")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Pause inserted between stages on the success path. Default: 2 s.
    ///
    /// Image models in particular reject bursts of requests; spacing the
    /// three calls keeps a single run under typical per-minute quotas.
    pub pacing: Duration,

    /// Text model id. `None` uses the provider default.
    pub text_model: Option<String>,

    /// Image model id. `None` uses the provider default.
    pub image_model: Option<String>,

    /// API key for the built-in Gemini provider. Falls back to the
    /// `GEMINI_API_KEY`, `GOOGLE_API_KEY` and `API_KEY` environment variables.
    pub api_key: Option<String>,

    /// Pre-constructed provider. Takes precedence over `api_key`.
    pub provider: Option<Arc<dyn GenerationProvider>>,

    /// Pause implementation. `None` uses a real tokio timer.
    pub pacer: Option<Arc<dyn Pacer>>,

    /// Per-call HTTP timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Characters of body text given to the back-cover prompt. Default: 500.
    pub back_cover_context_chars: usize,

    /// Labels printed by the layout engine.
    pub layout: LayoutOptions,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            text_model: None,
            image_model: None,
            api_key: None,
            provider: None,
            pacer: None,
            api_timeout_secs: 120,
            back_cover_context_chars: DEFAULT_BACK_COVER_CONTEXT_CHARS,
            layout: LayoutOptions::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("pacing", &self.pacing)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "provider",
                &self.provider.as_ref().map(|_| "<dyn GenerationProvider>"),
            )
            .field("pacer", &self.pacer.as_ref().map(|_| "<dyn Pacer>"))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("back_cover_context_chars", &self.back_cover_context_chars)
            .field("layout", &self.layout)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn pacing(mut self, pause: Duration) -> Self {
        self.config.pacing = pause;
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = Some(model.into());
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.config.pacer = Some(pacer);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn back_cover_context_chars(mut self, n: usize) -> Self {
        self.config.back_cover_context_chars = n;
        self
    }

    pub fn layout(mut self, options: LayoutOptions) -> Self {
        self.config.layout = options;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, EbookError> {
        let c = &self.config;
        if c.pacing > Duration::from_secs(300) {
            return Err(EbookError::InvalidConfig(format!(
                "pacing must be at most 300s, got {:?}",
                c.pacing
            )));
        }
        if c.back_cover_context_chars > 10_000 {
            return Err(EbookError::InvalidConfig(format!(
                "back cover context must be at most 10000 characters, got {}",
                c.back_cover_context_chars
            )));
        }
        if c.text_model.as_deref().is_some_and(|m| m.trim().is_empty())
            || c.image_model.as_deref().is_some_and(|m| m.trim().is_empty())
        {
            return Err(EbookError::InvalidConfig(
                "model ids must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = GenerationConfig::default();
        assert_eq!(c.pacing, Duration::from_secs(2));
        assert_eq!(c.back_cover_context_chars, 500);
        assert_eq!(c.api_timeout_secs, 120);
        assert!(c.provider.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let c = GenerationConfig::builder()
            .pacing(Duration::from_millis(10))
            .text_model("t")
            .image_model("i")
            .api_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.pacing, Duration::from_millis(10));
        assert_eq!(c.text_model.as_deref(), Some("t"));
        assert_eq!(c.image_model.as_deref(), Some("i"));
        assert_eq!(c.api_timeout_secs, 1, "timeout is clamped to 1s");
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(GenerationConfig::builder()
            .pacing(Duration::from_secs(301))
            .build()
            .is_err());
        assert!(GenerationConfig::builder().text_model(" ").build().is_err());
        assert!(GenerationConfig::builder()
            .back_cover_context_chars(20_000)
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = GenerationConfig::builder()
            .api_key("super-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
