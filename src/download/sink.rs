//! Progress and summary sinks.
//!
//! These traits let the engine report to whatever front end drives it (a
//! terminal progress bar, JSON output, a test recorder) without knowing
//! how the events are shown.

use serde::Serialize;

use super::summary::BatchSummary;

/// Emitted once per URL, after its outcome is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// URLs finished so far, including this one.
    pub completed: usize,
    /// URLs in the batch.
    pub total: usize,
    /// The URL that just finished.
    pub last_url: String,
}

/// Receives per-URL progress.
///
/// Called from the engine's single collector task, never concurrently.
/// Implementations should not block.
pub trait ProgressSink: Send + Sync {
    /// Handles one progress event.
    fn on_progress(&self, event: &ProgressEvent);
}

/// Receives the finished batch summary.
pub trait SummarySink: Send + Sync {
    /// Handles the final summary.
    fn on_summary(&self, summary: &BatchSummary);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event);
    }
}

/// A progress sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
