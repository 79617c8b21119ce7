//! Batch options and their validation.
//!
//! [`BatchOptions`] is the configuration surface of the engine. Values are
//! validated up front by [`BatchOptions::validate`], so a bad value stops
//! the batch before any request is made.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Default number of attempts per URL.
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Default connect/read timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default dispatch rate (0 means unlimited).
pub const DEFAULT_RATE_LIMIT_PER_SEC: f64 = 0.0;

/// Default number of concurrent fetches (sequential).
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Maximum allowed retry count.
pub const MAX_RETRY_COUNT: u32 = 10;

/// Maximum allowed dispatch rate per second.
pub const MAX_RATE_LIMIT_PER_SEC: f64 = 1000.0;

/// Allowed timeout range in seconds.
const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Concurrency above the supported maximum.
    #[error("invalid concurrency value {value}: must be between 0 and {MAX_CONCURRENCY}")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Retry count above the supported maximum.
    #[error("invalid retry count {value}: must be between 0 and {MAX_RETRY_COUNT}")]
    InvalidRetryCount {
        /// The invalid value that was provided.
        value: u32,
    },

    /// Timeout outside 1..=3600 seconds.
    #[error("invalid timeout {value}s: must be between 1 and 3600 seconds")]
    InvalidTimeout {
        /// The invalid value that was provided.
        value: u64,
    },

    /// Rate limit negative, not finite, or too high.
    #[error("invalid rate limit {value}: must be a finite number between 0 and {MAX_RATE_LIMIT_PER_SEC} requests per second")]
    InvalidRateLimit {
        /// The invalid value that was provided.
        value: f64,
    },

    /// Proxy URL that cannot be parsed or uses an unsupported scheme.
    #[error("invalid proxy URL '{url}': {reason}")]
    InvalidProxy {
        /// The proxy URL as given.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Options for one batch run.
///
/// # Default Values
///
/// - `retry_count`: 5
/// - `timeout_secs`: 30
/// - `rate_limit_per_sec`: 0 (unlimited)
/// - `proxy_url`: none
/// - `concurrency`: 1 (sequential)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOptions {
    /// Attempts per URL, including the first one (0 is treated as 1).
    pub retry_count: u32,
    /// Connect and per-read timeout in seconds.
    pub timeout_secs: u64,
    /// Global dispatch rate; 0 disables pacing.
    pub rate_limit_per_sec: f64,
    /// HTTP(S) proxy used for every request.
    pub proxy_url: Option<String>,
    /// Number of concurrent fetches; 0 and 1 both mean sequential.
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            rate_limit_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
            proxy_url: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl BatchOptions {
    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency {
                value: self.concurrency,
            });
        }
        if self.retry_count > MAX_RETRY_COUNT {
            return Err(ConfigError::InvalidRetryCount {
                value: self.retry_count,
            });
        }
        if !TIMEOUT_RANGE_SECS.contains(&self.timeout_secs) {
            return Err(ConfigError::InvalidTimeout {
                value: self.timeout_secs,
            });
        }
        if !self.rate_limit_per_sec.is_finite()
            || self.rate_limit_per_sec < 0.0
            || self.rate_limit_per_sec > MAX_RATE_LIMIT_PER_SEC
        {
            return Err(ConfigError::InvalidRateLimit {
                value: self.rate_limit_per_sec,
            });
        }
        if let Some(proxy) = &self.proxy_url {
            validate_proxy_url(proxy)?;
        }
        Ok(())
    }

    /// Timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Number of workers the engine runs (at least one).
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.concurrency.max(1)
    }
}

fn validate_proxy_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(raw).map_err(|e| ConfigError::InvalidProxy {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ConfigError::InvalidProxy {
                url: raw.to_string(),
                reason: format!("scheme '{scheme}' is not supported"),
            });
        }
    }
    if parsed.host().is_none() {
        return Err(ConfigError::InvalidProxy {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(())
}
