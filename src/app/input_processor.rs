//! Reading the input table from a file or standard input.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use csv_downloader_core::{UrlRecord, extract_urls, extract_urls_from_path, read_rows};
use tracing::info;

const STDIN_MARKER: &str = "-";

/// Extracts the unique URLs of the input named on the command line.
///
/// `-` reads standard input; anything else is opened as a file.
pub(crate) fn process_input(input: &Path, delimiter: u8) -> Result<Vec<UrlRecord>> {
    if input.as_os_str() == STDIN_MARKER {
        let rows = read_rows(io::stdin().lock(), delimiter)
            .context("Failed to read CSV from standard input")?;
        let urls = extract_urls(&rows);
        info!(rows = rows.len(), urls = urls.len(), "extracted URLs from stdin");
        return Ok(urls);
    }

    extract_urls_from_path(input, delimiter)
        .with_context(|| format!("Failed to read input '{}'", input.display()))
}
