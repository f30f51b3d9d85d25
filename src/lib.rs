//! # edgequake-ebook
//!
//! Turn a topic into an illustrated, paginated PDF eBook using generative
//! models.
//!
//! ## Pipeline Overview
//!
//! ```text
//! GenerationRequest
//!  │
//!  ├─ 1. Prompts   text + cover prompts from topic, tone, language, mode
//!  ├─ 2. Text      body + web citations (search off in children's mode)
//!  ├─ 3. Pause     fixed pacing between provider calls
//!  ├─ 4. Front     3:4 cover image
//!  ├─ 5. Pause
//!  ├─ 6. Back      3:4 image prompted with the opening of the text
//!  ├─ 7. Layout    A4 pages: covers, title, chapters, sources, footers
//!  └─ 8. Output    `<sanitised title>.pdf` + run stats
//! ```
//!
//! Stages run strictly one after another. The first failure ends the run
//! with a single [`EbookError`]; nothing partial is returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_ebook::{generate_to_file, GenerationConfig, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GEMINI_API_KEY / GOOGLE_API_KEY / API_KEY
//!     let request = GenerationRequest::new("Oceans").chapters(3);
//!     let (path, output) = generate_to_file(&request, ".", &GenerationConfig::default()).await?;
//!     eprintln!("{} pages -> {}", output.stats.page_count, path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ebookgen` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-ebook = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod filename;
pub mod generate;
pub mod layout;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod request;
pub mod sources;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use document::{CoverImage, EbookOutput, GeneratedDocument, GenerationStats, RenderedEbook};
pub use error::{EbookError, ProviderError};
pub use generate::{generate_document, generate_ebook, generate_ebook_sync, generate_to_file};
pub use layout::{LayoutEngine, LayoutOptions};
pub use pipeline::pacing::{Pacer, TokioPacer};
pub use pipeline::{GenerationPipeline, PipelineState, Stage};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use provider::{GeminiProvider, GenerationProvider};
pub use request::{CoverStyle, GenerationRequest, Tone};
pub use sources::Source;
