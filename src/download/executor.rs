//! Resilient fetch of a single URL: attempts, backoff and pacing.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::PathAllocator;
use super::outcome::{DownloadOutcome, DownloadTarget};
use super::rate_limiter::RateLimiter;
use super::retry::{RetryDecision, RetryPolicy};

/// Fetches one target, retrying transient failures.
///
/// The caller paces the first attempt; every retry waits out its backoff
/// delay and then takes a fresh slot from `rate_limiter`. Cancellation is
/// observed during the request, the body stream, the backoff sleep and
/// the pacing wait.
///
/// Never returns an error: every failure ends up in
/// [`DownloadOutcome::Failure`].
#[instrument(skip_all, fields(url = %target.url))]
pub async fn download_with_retry(
    client: &HttpClient,
    target: &DownloadTarget,
    policy: &RetryPolicy,
    rate_limiter: &RateLimiter,
    allocator: &PathAllocator,
    cancel: &CancellationToken,
) -> DownloadOutcome {
    let url = target.url.as_str();
    let mut attempt = 1u32;

    loop {
        debug!(attempt, "attempting download");

        let error = match client
            .download_to_file(url, &target.destination_dir, allocator, cancel)
            .await
        {
            Ok(result) => {
                return DownloadOutcome::Success {
                    url: url.to_string(),
                    bytes_written: result.bytes_written,
                    path: result.path,
                };
            }
            Err(error) => error,
        };

        let failure_type = policy.classify(&error);
        match policy.should_retry(failure_type, attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next_attempt,
            } => {
                info!(
                    attempt,
                    next_attempt,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "retrying after transient failure"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        return DownloadOutcome::failure(url, DownloadError::cancelled(url));
                    }
                    () = tokio::time::sleep(delay) => {}
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        return DownloadOutcome::failure(url, DownloadError::cancelled(url));
                    }
                    () = rate_limiter.acquire() => {}
                }

                attempt = next_attempt;
            }
            RetryDecision::DoNotRetry { reason } => {
                warn!(attempts = attempt, error = %error, reason = %reason, "download failed");
                return DownloadOutcome::failure(url, error);
            }
        }
    }
}
