//! Batch orchestration: a bounded worker pool over a shared URL queue.
//!
//! This module provides the [`DownloadEngine`], which fetches every URL of
//! a batch into one directory with the concurrency, pacing, retry, timeout
//! and proxy settings of a validated [`BatchOptions`].
//!
//! # Concurrency Model
//!
//! - `worker_count()` tasks pull from one queue in input order
//! - Popping a URL and claiming its first pacing slot happen under the
//!   queue lock, so dispatch order always follows input order
//! - Outcomes flow through an mpsc channel to a single collector that owns
//!   the [`BatchSummary`] and emits progress
//! - With one worker the batch is strictly sequential
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use csv_downloader_core::{BatchOptions, DownloadEngine, NoopProgressSink, UrlRecord};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(BatchOptions::default())?;
//! let urls: Vec<UrlRecord> = ["https://example.com/a.pdf"]
//!     .into_iter()
//!     .filter_map(UrlRecord::new)
//!     .collect();
//! let summary = engine
//!     .run(&urls, Path::new("./downloads"), &NoopProgressSink, &CancellationToken::new())
//!     .await?;
//! println!("{}", summary.report());
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::executor::download_with_retry;
use super::filename::PathAllocator;
use super::outcome::{DownloadOutcome, DownloadTarget};
use super::rate_limiter::RateLimiter;
use super::retry::RetryPolicy;
use super::sink::{ProgressEvent, ProgressSink};
use super::summary::{BatchSummary, FailureKind};
use crate::config::{BatchOptions, ConfigError};
use crate::parser::UrlRecord;

/// Errors that stop a batch before or instead of running it.
///
/// Per-URL failures never surface here; they are recorded in the
/// [`BatchSummary`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Options failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No URLs to download.
    #[error("no URLs found to download")]
    EmptyBatch,

    /// The destination is missing or not a directory.
    #[error("destination {path} is not a directory")]
    InvalidDestination {
        /// The rejected destination.
        path: PathBuf,
    },

    /// The HTTP client could not be constructed.
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Shared queue of `(input index, url)` pairs still to dispatch.
type DispatchQueue = Arc<Mutex<VecDeque<(usize, UrlRecord)>>>;

/// Runs download batches.
///
/// One engine holds one HTTP client (connection pool) and one pacer; both
/// are shared by every worker of every batch it runs.
#[derive(Debug)]
pub struct DownloadEngine {
    options: BatchOptions,
    client: HttpClient,
    retry_policy: RetryPolicy,
    rate_limiter: Arc<RateLimiter>,
}

impl DownloadEngine {
    /// Validates `options` and builds the client, retry policy and pacer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for an invalid option and
    /// [`EngineError::Client`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip_all)]
    pub fn new(options: BatchOptions) -> Result<Self, EngineError> {
        options.validate()?;

        let client = HttpClient::from_options(&options).map_err(EngineError::Client)?;
        let retry_policy = RetryPolicy::with_max_attempts(options.retry_count);
        let rate_limiter = Arc::new(RateLimiter::per_second(options.rate_limit_per_sec));

        debug!(
            workers = options.worker_count(),
            max_attempts = retry_policy.max_attempts(),
            timeout_secs = options.timeout_secs,
            rate_limit_per_sec = options.rate_limit_per_sec,
            proxy = options.proxy_url.is_some(),
            "creating download engine"
        );

        Ok(Self {
            options,
            client,
            retry_policy,
            rate_limiter,
        })
    }

    /// Replaces the retry policy derived from the options.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Returns the options the engine was built with.
    #[must_use]
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Returns the retry policy in use.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Downloads every URL into `destination_dir`.
    ///
    /// Each URL yields exactly one outcome and one progress event. After
    /// `cancel` fires no new URL is dispatched, in-flight downloads stop at
    /// their next suspension point, and every URL without a result is
    /// recorded as a `Cancelled` failure.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyBatch`] for an empty URL list and
    /// [`EngineError::InvalidDestination`] when `destination_dir` is not a
    /// directory. Individual download failures do NOT cause this method to
    /// error.
    #[instrument(skip_all, fields(total = urls.len(), destination = %destination_dir.display()))]
    pub async fn run(
        &self,
        urls: &[UrlRecord],
        destination_dir: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, EngineError> {
        if urls.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        if !destination_dir.is_dir() {
            return Err(EngineError::InvalidDestination {
                path: destination_dir.to_path_buf(),
            });
        }

        let total = urls.len();
        let workers = self.options.worker_count().min(total);
        info!(total, workers, "starting batch");

        let queue: DispatchQueue = Arc::new(Mutex::new(urls.iter().cloned().enumerate().collect()));
        let allocator = Arc::new(PathAllocator::new());
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            let worker = Worker {
                id: worker_id,
                queue: Arc::clone(&queue),
                client: self.client.clone(),
                retry_policy: self.retry_policy.clone(),
                rate_limiter: Arc::clone(&self.rate_limiter),
                allocator: Arc::clone(&allocator),
                destination_dir: destination_dir.to_path_buf(),
                cancel: cancel.clone(),
                outcomes: outcome_tx.clone(),
            };
            tasks.spawn(worker.run());
        }
        drop(outcome_tx);

        let mut summary = BatchSummary::new(total);
        let mut reported = vec![false; total];

        while let Some((index, outcome)) = outcome_rx.recv().await {
            reported[index] = true;
            record_outcome(&mut summary, &outcome, progress);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "download worker panicked");
            }
        }

        // URLs never dispatched after cancellation, or lost with a panicked worker
        for (index, url) in urls.iter().enumerate() {
            if reported[index] {
                continue;
            }
            let error = if cancel.is_cancelled() {
                DownloadError::cancelled(url.as_str())
            } else {
                DownloadError::aborted(url.as_str())
            };
            record_outcome(
                &mut summary,
                &DownloadOutcome::failure(url.as_str(), error),
                progress,
            );
        }

        summary.cancelled = summary
            .errors
            .iter()
            .any(|e| e.kind == FailureKind::Cancelled);

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            bytes = summary.bytes_written,
            cancelled = summary.cancelled,
            "batch complete"
        );

        Ok(summary)
    }
}

fn record_outcome(summary: &mut BatchSummary, outcome: &DownloadOutcome, progress: &dyn ProgressSink) {
    summary.record(outcome);
    progress.on_progress(&ProgressEvent {
        completed: summary.completed(),
        total: summary.total,
        last_url: outcome.url().to_string(),
    });
}

/// Everything one worker task owns.
struct Worker {
    id: usize,
    queue: DispatchQueue,
    client: HttpClient,
    retry_policy: RetryPolicy,
    rate_limiter: Arc<RateLimiter>,
    allocator: Arc<PathAllocator>,
    destination_dir: PathBuf,
    cancel: CancellationToken,
    outcomes: mpsc::UnboundedSender<(usize, DownloadOutcome)>,
}

impl Worker {
    async fn run(self) {
        while let Some((index, url)) = self.next_dispatch().await {
            let target = DownloadTarget::new(url, self.destination_dir.clone());
            let outcome = download_with_retry(
                &self.client,
                &target,
                &self.retry_policy,
                &self.rate_limiter,
                &self.allocator,
                &self.cancel,
            )
            .await;
            if self.outcomes.send((index, outcome)).is_err() {
                break;
            }
        }
        debug!(worker_id = self.id, "worker finished");
    }

    /// Pops the next URL and claims its first pacing slot under the queue lock.
    async fn next_dispatch(&self) -> Option<(usize, UrlRecord)> {
        let mut queue = self.queue.lock().await;
        if self.cancel.is_cancelled() {
            return None;
        }
        let next = queue.pop_front()?;
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                queue.push_front(next);
                None
            }
            () = self.rate_limiter.acquire() => Some(next),
        }
    }
}
