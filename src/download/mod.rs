//! Batch HTTP downloads into a destination directory.
//!
//! This module turns a list of [`UrlRecord`](crate::parser::UrlRecord)s
//! into files on disk, one file per URL, with bounded concurrency, global
//! pacing and retries for transient failures.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Filenames from Content-Disposition headers or the URL path, sanitized
//!   for common filesystems
//! - Collision-free naming (`name (1).ext`), never overwriting a file
//! - Exponential backoff on retryable statuses and transport failures
//! - Cancellation at every suspension point
//! - One outcome and one progress event per URL
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use csv_downloader_core::download::{HttpClient, PathAllocator};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(Duration::from_secs(30), None)?;
//! let result = client
//!     .download_to_file(
//!         "https://example.com/paper.pdf",
//!         Path::new("./downloads"),
//!         &PathAllocator::new(),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("Downloaded: {}", result.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod executor;
mod filename;
mod outcome;
mod rate_limiter;
mod retry;
mod sink;
mod summary;

pub use client::{DownloadFileResult, HttpClient};
pub use engine::{DownloadEngine, EngineError};
pub use error::DownloadError;
pub use executor::download_with_retry;
pub use filename::{PathAllocator, resolve_name, sanitize_filename, unique_path};
pub use outcome::{DownloadOutcome, DownloadTarget};
pub use rate_limiter::RateLimiter;
pub use retry::{FailureType, RetryDecision, RetryPolicy};
pub use sink::{NoopProgressSink, ProgressEvent, ProgressSink, SummarySink};
pub use summary::{BatchError, BatchSummary, FailureKind};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
