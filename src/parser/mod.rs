//! Input parsing module for extracting download URLs from tabular data.
//!
//! Tabular decoding is kept separate from URL extraction: [`read_rows`]
//! turns a CSV byte stream into rows of text cells, and [`extract_urls`]
//! works on any sequence of rows, whatever produced them.
//!
//! # Example
//!
//! ```
//! use csv_downloader_core::parser::extract_urls;
//!
//! let rows = vec![
//!     vec!["name", "link"],
//!     vec!["paper", "https://example.com/a.pdf, https://example.com/b.pdf"],
//!     vec!["again", "https://example.com/a.pdf"],
//! ];
//! let urls = extract_urls(&rows);
//! assert_eq!(urls.len(), 2);
//! assert_eq!(urls[0].as_str(), "https://example.com/a.pdf");
//! ```

mod error;
mod table;
mod url;

pub use error::ExtractionError;
pub use table::{DEFAULT_DELIMITER, read_rows};
pub use url::{UrlRecord, extract_urls, urls_in_cell};

use std::fs::File;
use std::path::Path;

use tracing::{info, instrument};

/// Opens a CSV file, decodes it and extracts every unique URL in it.
///
/// # Errors
///
/// Returns [`ExtractionError::Io`] when the file cannot be opened and any
/// decoding error from [`read_rows`].
#[instrument(fields(path = %path.display()))]
pub fn extract_urls_from_path(path: &Path, delimiter: u8) -> Result<Vec<UrlRecord>, ExtractionError> {
    let file = File::open(path).map_err(|e| ExtractionError::io(path, e))?;
    let rows = read_rows(file, delimiter)?;
    let urls = extract_urls(&rows);
    info!(rows = rows.len(), urls = urls.len(), "extracted URLs from table");
    Ok(urls)
}
