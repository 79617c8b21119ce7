//! Retry logic with exponential backoff for transient download failures.
//!
//! When a download fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - Temporary failures that may succeed on retry
//! - [`FailureType::Permanent`] - Failures that won't succeed regardless of retries
//!
//! The [`RetryPolicy`] then determines whether to retry based on failure type
//! and attempt count, calculating exponential backoff delays.
//!
//! # Example
//!
//! ```
//! use csv_downloader_core::download::{DownloadError, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! let error = DownloadError::http_status("https://example.com/file.pdf", 503);
//! let failure_type = policy.classify(&error);
//!
//! match policy.should_retry(failure_type, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, instrument};

use super::DownloadError;
use super::constants::{DEFAULT_BACKOFF_BASE, DEFAULT_RETRYABLE_STATUS_CODES, MAX_BACKOFF_DELAY};
use crate::config::DEFAULT_RETRY_COUNT;

/// Classification of download failure types.
///
/// Used to determine whether a failed download should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: connect/read timeout, retryable 5xx, connection reset.
    Transient,

    /// Permanent failure that won't succeed regardless of retries.
    ///
    /// Examples: 404 Not Found, invalid URL, disk errors, empty body.
    Permanent,
}

/// Decision on whether to retry a failed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the download after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the download.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Retry behavior for a single URL.
///
/// # Default Values
///
/// - `max_attempts`: 5
/// - `backoff_base`: 1 second
/// - `max_delay`: 32 seconds
/// - `retryable_status_codes`: 500, 502, 503, 504
///
/// # Delay Calculation
///
/// ```text
/// delay = min(backoff_base * 2^(attempt - 1), max_delay)
/// ```
///
/// With defaults the waits between attempts are 1s, 2s, 4s, 8s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay before the first retry.
    backoff_base: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// HTTP statuses worth another attempt.
    retryable_status_codes: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_COUNT,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_delay: MAX_BACKOFF_DELAY,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy with custom attempts and backoff base.
    ///
    /// `max_attempts` below 1 is raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            ..Self::default()
        }
    }

    /// Creates a policy with a custom max_attempts, using defaults for other settings.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Replaces the set of retryable HTTP statuses.
    #[must_use]
    pub fn with_retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay before the first retry.
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    /// Whether `status` is worth another attempt.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    /// Classifies a download error for retry decisions.
    ///
    /// | Error | Type |
    /// |-------|------|
    /// | HTTP status in the retryable set | Transient |
    /// | Any other HTTP status | Permanent |
    /// | Timeout | Transient |
    /// | Network (most) | Transient |
    /// | Network (TLS, redirect loop, bad request) | Permanent |
    /// | IO, InvalidUrl, EmptyContent, Cancelled, Aborted | Permanent |
    #[instrument(skip(self))]
    pub fn classify(&self, error: &DownloadError) -> FailureType {
        match error {
            DownloadError::HttpStatus { status, .. } => {
                if self.is_retryable_status(*status) {
                    FailureType::Transient
                } else {
                    FailureType::Permanent
                }
            }

            DownloadError::Timeout { .. } => FailureType::Transient,

            DownloadError::Network { source, .. } => {
                if is_tls_error(source) || source.is_redirect() || source.is_builder() {
                    FailureType::Permanent
                } else {
                    FailureType::Transient
                }
            }

            DownloadError::Io { .. }
            | DownloadError::InvalidUrl { .. }
            | DownloadError::EmptyContent { .. }
            | DownloadError::Cancelled { .. }
            | DownloadError::Aborted { .. } => FailureType::Permanent,
        }
    }

    /// Determines whether to retry a failed download.
    ///
    /// `attempt` is the 1-indexed attempt that just failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.backoff_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Delay after the failed `attempt`: `backoff_base * 2^(attempt - 1)`, capped.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_base
            .checked_mul(1_u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Checks if a reqwest error is a TLS/certificate error.
fn is_tls_error(error: &reqwest::Error) -> bool {
    // TLS errors only show up in the message chain
    let mut message = error.to_string().to_lowercase();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message.push(' ');
        message.push_str(&inner.to_string().to_lowercase());
        source = inner.source();
    }
    message.contains("certificate")
        || message.contains("tls")
        || message.contains("ssl")
        || message.contains("handshake")
}
