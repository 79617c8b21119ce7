//! URL extraction from tabular cell text.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument, trace};

/// Regex pattern for finding URLs in a cell.
/// Matches http:// and https:// (any case) up to whitespace, a comma, a quote or an angle bracket,
/// so comma-joined lists inside one cell split into separate URLs.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s,"'<>]+"#).expect("URL regex is valid") // Static pattern, safe to panic
});

/// A download URL found in the input.
///
/// The wrapped string always starts with `http://` or `https://` (any case)
/// and contains no whitespace or quote characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UrlRecord {
    url: String,
}

impl UrlRecord {
    /// Wraps `raw` after checking the URL invariant.
    ///
    /// Returns `None` when the scheme is not http(s), nothing follows the
    /// scheme, or the string contains whitespace or quotes.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
        let rest = if lower.starts_with("https://") {
            &raw[8..]
        } else if lower.starts_with("http://") {
            &raw[7..]
        } else {
            return None;
        };
        if rest.is_empty() || raw.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
            return None;
        }
        Some(Self {
            url: raw.to_string(),
        })
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Consumes the record, returning the URL string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for UrlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl AsRef<str> for UrlRecord {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

/// Finds every URL candidate inside a single cell, in order of appearance.
///
/// Duplicates within the cell are kept; see [`extract_urls`] for de-duplication.
#[must_use]
pub fn urls_in_cell(cell: &str) -> Vec<UrlRecord> {
    URL_PATTERN
        .find_iter(cell)
        .filter_map(|m| {
            let cleaned = m.as_str().trim().trim_matches(|c| c == '"' || c == '\'');
            trace!(url = %cleaned, "found URL candidate");
            UrlRecord::new(cleaned)
        })
        .collect()
}

/// Extracts unique HTTP(S) URLs from rows of cells.
///
/// Every cell of every row is scanned; a cell may hold several URLs. A URL
/// that was already emitted (exact, case-sensitive match) is skipped, so the
/// result keeps first-occurrence order. Empty cells are skipped and an empty
/// result is not an error.
///
/// # Examples
///
/// ```
/// use csv_downloader_core::parser::extract_urls;
///
/// let rows = vec![vec!["https://a.example/x", "'https://a.example/y'"]];
/// let urls = extract_urls(&rows);
/// assert_eq!(urls[1].as_str(), "https://a.example/y");
/// ```
#[instrument(skip(rows))]
pub fn extract_urls<R, C>(rows: R) -> Vec<UrlRecord>
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut urls = Vec::new();

    for row in rows {
        for cell in row {
            let cell = cell.as_ref();
            if cell.trim().is_empty() {
                continue;
            }
            for record in urls_in_cell(cell) {
                if seen.insert(record.as_str().to_string()) {
                    urls.push(record);
                } else {
                    trace!(url = %record, "skipping duplicate URL");
                }
            }
        }
    }

    debug!(count = urls.len(), "URL extraction complete");
    urls
}
