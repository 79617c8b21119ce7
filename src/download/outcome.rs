//! Per-URL work items and their results.

use std::path::PathBuf;

use crate::parser::UrlRecord;

use super::error::DownloadError;

/// One URL to fetch into one destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// The URL to fetch.
    pub url: UrlRecord,
    /// Directory the file is written into.
    pub destination_dir: PathBuf,
}

impl DownloadTarget {
    /// Creates a target.
    pub fn new(url: UrlRecord, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            url,
            destination_dir: destination_dir.into(),
        }
    }
}

/// Result of fetching one URL. Every URL of a batch yields exactly one.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The file was written.
    Success {
        /// The URL that was fetched.
        url: String,
        /// Bytes written to disk (always > 0).
        bytes_written: u64,
        /// Where the file ended up.
        path: PathBuf,
    },
    /// The URL could not be fetched.
    Failure {
        /// The URL that failed.
        url: String,
        /// Why it failed, after any retries.
        error: DownloadError,
    },
}

impl DownloadOutcome {
    /// Creates a failure outcome.
    pub fn failure(url: impl Into<String>, error: DownloadError) -> Self {
        Self::Failure {
            url: url.into(),
            error,
        }
    }

    /// The URL this outcome belongs to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    /// Whether the download succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
