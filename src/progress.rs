//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to follow a
//! run as it moves through its stages and pauses.
//!
//! # Example
//!
//! ```rust
//! use edgequake_ebook::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, output_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done ({output_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::Stage;
use std::sync::Arc;
use std::time::Duration;

/// Called by the pipeline and the layout step as a run progresses.
///
/// All methods have no-op defaults so callers only override what they
/// care about. Calls arrive strictly in order from a single task.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once, before the first provider call.
    fn on_generation_start(&self, total_stages: usize) {
        let _ = total_stages;
    }

    /// Called just before a stage's provider request is sent.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage succeeded.
    ///
    /// `output_len` is the text length in bytes or the image size in bytes.
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called when a stage failed; no further stage will run.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called when a pacing pause begins, before `next` starts.
    fn on_pacing(&self, next: Stage, pause: Duration) {
        let _ = (next, pause);
    }

    /// Called after the PDF has been laid out.
    fn on_layout_complete(&self, page_count: usize) {
        let _ = page_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
