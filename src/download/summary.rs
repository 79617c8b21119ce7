//! Batch accounting and the human-readable report.

use std::fmt::Write as _;

use serde::Serialize;

use super::constants::ERROR_PREVIEW_LIMIT;
use super::error::DownloadError;
use super::outcome::DownloadOutcome;

/// Coarse failure class shown to users and in JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// DNS, connect, reset or TLS failure.
    Network,
    /// Connect or read timeout.
    Timeout,
    /// Non-success HTTP status.
    HttpStatus(u16),
    /// Server sent an empty body.
    EmptyContent,
    /// Local file could not be created or written.
    Filesystem,
    /// URL could not be requested.
    InvalidUrl,
    /// Batch cancelled before the download finished.
    Cancelled,
    /// Download task lost without a result.
    Aborted,
}

impl From<&DownloadError> for FailureKind {
    fn from(error: &DownloadError) -> Self {
        match error {
            DownloadError::Network { .. } => Self::Network,
            DownloadError::Timeout { .. } => Self::Timeout,
            DownloadError::HttpStatus { status, .. } => Self::HttpStatus(*status),
            DownloadError::EmptyContent { .. } => Self::EmptyContent,
            DownloadError::Io { .. } => Self::Filesystem,
            DownloadError::InvalidUrl { .. } => Self::InvalidUrl,
            DownloadError::Cancelled { .. } => Self::Cancelled,
            DownloadError::Aborted { .. } => Self::Aborted,
        }
    }
}

/// A failed URL and the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchError {
    /// The URL that failed.
    pub url: String,
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable reason.
    pub reason: String,
}

/// Totals for one batch run.
///
/// Once a run has finished, `succeeded + failed == total` and
/// `errors.len() == failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Number of URLs in the batch.
    pub total: usize,
    /// URLs written to disk.
    pub succeeded: usize,
    /// URLs that failed.
    pub failed: usize,
    /// Bytes written across all successful downloads.
    pub bytes_written: u64,
    /// Every failure, in completion order.
    pub errors: Vec<BatchError>,
    /// Whether the batch was cancelled before finishing.
    pub cancelled: bool,
}

impl BatchSummary {
    /// Creates an empty summary for a batch of `total` URLs.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Folds one outcome into the totals.
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success { bytes_written, .. } => {
                self.succeeded += 1;
                self.bytes_written += bytes_written;
            }
            DownloadOutcome::Failure { url, error } => {
                self.failed += 1;
                self.errors.push(BatchError {
                    url: url.clone(),
                    kind: FailureKind::from(error),
                    reason: error.to_string(),
                });
            }
        }
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// True when nothing failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// The failures shown in [`BatchSummary::report`].
    #[must_use]
    pub fn error_preview(&self) -> &[BatchError] {
        &self.errors[..self.errors.len().min(ERROR_PREVIEW_LIMIT)]
    }

    /// Renders the end-of-batch report.
    ///
    /// With no failures this is a single success line. Otherwise it lists
    /// the totals and the first ten failures.
    #[must_use]
    pub fn report(&self) -> String {
        if self.failed == 0 {
            return format!(
                "Downloaded all {} file(s) successfully ({} bytes)",
                self.total, self.bytes_written
            );
        }

        let mut out = format!(
            "Total: {}  Succeeded: {}  Failed: {}",
            self.total, self.succeeded, self.failed
        );
        if self.cancelled {
            out.push_str("  (cancelled)");
        }
        out.push_str("\nFailures:");
        for error in self.error_preview() {
            let _ = write!(out, "\n  {} \u{2192} {}", error.url, error.reason);
        }
        let hidden = self.errors.len() - self.error_preview().len();
        if hidden > 0 {
            let _ = write!(out, "\n  ... and {hidden} more");
        }
        out
    }
}
