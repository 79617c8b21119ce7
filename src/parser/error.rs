//! Error types for input parsing operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a tabular source from being read at all.
///
/// Individual cells never produce errors: cells without URLs are skipped.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The source file could not be opened or read.
    #[error("cannot read input {path}: {source}\n  Suggestion: Check that the file exists and is readable")]
    Io {
        /// Path of the source that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The byte stream is not valid delimited text.
    #[error("malformed tabular input at line {line}: {reason}\n  Suggestion: Save the file as UTF-8 CSV and try again")]
    Malformed {
        /// 1-based line where decoding failed (0 when unknown).
        line: u64,
        /// Decoder message.
        reason: String,
    },
}

impl ExtractionError {
    /// Creates an IO error for the given source path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed-input error from a CSV decoder error.
    #[must_use]
    pub fn from_csv(error: &csv::Error) -> Self {
        let line = error.position().map_or(0, csv::Position::line);
        Self::Malformed {
            line,
            reason: error.to_string(),
        }
    }
}
