//! Constants for the download module (backoff, naming, buffering).

use std::time::Duration;

/// Default base delay for exponential backoff (1 second).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Upper bound for a single backoff delay (32 seconds).
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(32);

/// HTTP status codes retried by default.
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Name used when neither the response nor the URL yields one.
pub const PLACEHOLDER_FILENAME: &str = "file";

/// Maximum length of a filename base, in characters, before the extension.
pub const MAX_BASE_NAME_CHARS: usize = 150;

/// Buffer size for streaming response bodies to disk (64 KiB).
pub const WRITE_BUFFER_BYTES: usize = 64 * 1024;

/// Number of failures shown in a batch report.
pub const ERROR_PREVIEW_LIMIT: usize = 10;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("csv-downloader/", env!("CARGO_PKG_VERSION"));
