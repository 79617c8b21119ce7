//! Global request pacing for a download batch.
//!
//! This module provides the [`RateLimiter`] struct which spaces out request
//! dispatch across every worker of a batch, so the long-run request rate
//! never exceeds the configured number of requests per second regardless of
//! how many fetches run concurrently.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use csv_downloader_core::download::RateLimiter;
//!
//! # async fn example() {
//! // Two requests per second across the whole batch
//! let limiter = Arc::new(RateLimiter::per_second(2.0));
//!
//! // First request proceeds immediately
//! limiter.acquire().await;
//!
//! // Second request waits until 500ms after the first
//! limiter.acquire().await;
//! # }
//! ```

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

/// Batch-wide pacer for request dispatch.
///
/// Designed to be wrapped in `Arc` and shared across worker tasks. A single
/// `tokio::sync::Mutex` guards the time of the last dispatch; callers queue
/// on it, so waiters are released one interval apart.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between two dispatches.
    interval: Duration,

    /// Whether pacing is disabled (rate of 0).
    disabled: bool,

    /// Time of the last dispatch. `None` until the first one, which is immediate.
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a pacer with a fixed minimum interval between dispatches.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = interval.as_millis()))]
    pub fn new(interval: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            interval,
            disabled: interval.is_zero(),
            last_dispatch: Mutex::new(None),
        }
    }

    /// Creates a pacer allowing `rate` dispatches per second.
    ///
    /// A rate of 0 (or anything not positive and finite) disables pacing.
    #[must_use]
    pub fn per_second(rate: f64) -> Self {
        if rate.is_finite() && rate > 0.0 {
            Self::new(Duration::from_secs_f64(1.0 / rate))
        } else {
            Self::disabled()
        }
    }

    /// Creates a disabled pacer that applies no delays.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            interval: Duration::ZERO,
            disabled: true,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the minimum interval between dispatches.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the next dispatch slot and claims it.
    ///
    /// The first call returns immediately. Dropping the future while it
    /// waits gives the slot up without recording a dispatch.
    pub async fn acquire(&self) {
        if self.disabled {
            return;
        }

        let mut last_dispatch = self.last_dispatch.lock().await;

        if let Some(last) = *last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let delay = self.interval.saturating_sub(elapsed);
                trace!(delay_ms = delay.as_millis(), "pacing request");
                tokio::time::sleep(delay).await;
            }
        }

        *last_dispatch = Some(Instant::now());
    }
}
