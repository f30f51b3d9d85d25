//! Pauses between provider calls.
//!
//! The pipeline never sleeps directly; it asks a [`Pacer`]. Production runs
//! use [`TokioPacer`], tests inject a recorder so pacing can be asserted
//! without waiting on the wall clock.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Something that can suspend the pipeline for a fixed interval.
///
/// A pause always runs to completion; there is no early wake-up.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real pauses backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        debug!("Pacing for {}ms", duration.as_millis());
        tokio::time::sleep(duration).await;
    }
}
