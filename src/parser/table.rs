//! CSV decoding into rows of text cells.

use std::io::Read;

use csv::ReaderBuilder;
use tracing::{debug, instrument};

use super::error::ExtractionError;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Decodes a delimited UTF-8 byte stream into rows of cells.
///
/// Every row is kept, including a header row if there is one; rows may have
/// different lengths. A leading byte-order mark is dropped.
///
/// # Errors
///
/// Returns [`ExtractionError::Malformed`] when the stream is not valid UTF-8
/// or the underlying reader fails mid-way.
#[instrument(skip(reader))]
pub fn read_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Vec<String>>, ExtractionError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| ExtractionError::from_csv(&e))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if rows.is_empty()
            && let Some(first) = row.first_mut()
            && first.starts_with('\u{feff}')
        {
            *first = first.trim_start_matches('\u{feff}').to_string();
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), "decoded tabular input");
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows_keeps_header_and_ragged_rows() {
        let input = "name,url\nfirst,https://a.example/x\nonly-one-cell\n";
        let rows = read_rows(input.as_bytes(), DEFAULT_DELIMITER).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["name", "url"]);
        assert_eq!(rows[2], vec!["only-one-cell"]);
    }

    #[test]
    fn test_read_rows_quoted_cell_keeps_commas() {
        let input = "\"https://a.example/1, https://a.example/2\",x\n";
        let rows = read_rows(input.as_bytes(), DEFAULT_DELIMITER).unwrap();
        assert_eq!(rows[0][0], "https://a.example/1, https://a.example/2");
    }

    #[test]
    fn test_read_rows_custom_delimiter() {
        let input = "a;https://a.example/f.pdf\n";
        let rows = read_rows(input.as_bytes(), b';').unwrap();
        assert_eq!(rows[0], vec!["a", "https://a.example/f.pdf"]);
    }

    #[test]
    fn test_read_rows_strips_byte_order_mark() {
        let input = "\u{feff}https://a.example/f.pdf\n";
        let rows = read_rows(input.as_bytes(), DEFAULT_DELIMITER).unwrap();
        assert_eq!(rows[0][0], "https://a.example/f.pdf");
    }

    #[test]
    fn test_read_rows_invalid_utf8_is_malformed() {
        let input: &[u8] = b"ok\n\xff\xfe\xfd,bad\n";
        let result = read_rows(input, DEFAULT_DELIMITER);
        assert!(matches!(result, Err(ExtractionError::Malformed { .. })));
    }

    #[test]
    fn test_read_rows_empty_input() {
        let rows = read_rows(&b""[..], DEFAULT_DELIMITER).unwrap();
        assert!(rows.is_empty());
    }
}
