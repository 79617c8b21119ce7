//! CSV Downloader Core Library
//!
//! This library provides the batch acquisition engine behind the
//! `csv-downloader` tool: it finds every HTTP(S) URL in tabular input and
//! downloads each one into a destination directory under a safe,
//! collision-free filename.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Tabular input decoding and URL extraction
//! - [`download`] - Filename resolution, the resilient HTTP executor and the
//!   batch orchestrator
//! - [`config`] - Validated batch options

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod parser;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{
    BatchOptions, ConfigError, DEFAULT_CONCURRENCY, DEFAULT_RATE_LIMIT_PER_SEC,
    DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT_SECS,
};
pub use download::{
    BatchError, BatchSummary, DownloadEngine, DownloadError, DownloadOutcome, DownloadTarget,
    EngineError, FailureKind, HttpClient, NoopProgressSink, PathAllocator, ProgressEvent,
    ProgressSink, RateLimiter, RetryPolicy, SummarySink,
};
pub use parser::{ExtractionError, UrlRecord, extract_urls, extract_urls_from_path, read_rows};
