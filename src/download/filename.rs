//! Filename derivation, sanitization, and unique path reservation.
//!
//! A download is named from its `Content-Disposition` header when the
//! server sends one, otherwise from the last path segment of its URL. The
//! candidate is then made safe for common filesystems by
//! [`sanitize_filename`], and [`PathAllocator`] turns it into a path that
//! no other download of the batch is using.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tokio::fs::{File, OpenOptions};
use tokio::sync::Mutex;
use tracing::{debug, trace};
use url::Url;

use super::constants::{MAX_BASE_NAME_CHARS, PLACEHOLDER_FILENAME};
use super::error::DownloadError;

/// `filename*=charset'lang'percent-encoded` (RFC 5987).
#[allow(clippy::expect_used)]
static EXTENDED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*\s*=\s*[^'"]*''([^;]+)"#).expect("extended filename regex is valid")
});

/// `filename="..."`.
#[allow(clippy::expect_used)]
static QUOTED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*"([^"]+)""#).expect("quoted filename regex is valid")
});

/// `filename=...` up to the next `;`.
#[allow(clippy::expect_used)]
static BARE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)filename\s*=\s*([^;]+)").expect("bare filename regex is valid")
});

/// Device names Windows refuses as file bases.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Derives the sanitized name for a download.
///
/// Precedence: `filename*=` (percent-decoded), quoted `filename=`, bare
/// `filename=`, the URL's last path segment (percent-decoded, query
/// ignored), then the `"file"` placeholder. A tier that yields only
/// whitespace falls through to the next one.
///
/// # Examples
///
/// ```
/// use csv_downloader_core::download::resolve_name;
///
/// let name = resolve_name(
///     "https://a.example/get?id=1",
///     Some("attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"),
/// );
/// assert_eq!(name, "résumé.pdf");
/// ```
#[must_use]
pub fn resolve_name(url: &str, content_disposition: Option<&str>) -> String {
    let candidate = content_disposition
        .and_then(parse_content_disposition)
        .or_else(|| filename_from_url(url))
        .unwrap_or_else(|| PLACEHOLDER_FILENAME.to_string());
    let name = sanitize_filename(&candidate);
    trace!(url, candidate = %candidate, name = %name, "resolved filename");
    name
}

/// Extracts the filename parameter from a `Content-Disposition` value.
///
/// Handles:
/// - `attachment; filename*=UTF-8''example%20file.pdf` (RFC 5987)
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename=example.pdf`
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(caps) = EXTENDED_FILENAME.captures(header) {
        let decoded = percent_decode(caps[1].trim());
        if !decoded.trim().is_empty() {
            return Some(decoded);
        }
    }

    if let Some(caps) = QUOTED_FILENAME.captures(header)
        && !caps[1].trim().is_empty()
    {
        return Some(caps[1].to_string());
    }

    if let Some(caps) = BARE_FILENAME.captures(header) {
        let value = caps[1].trim().trim_matches('"').trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}

/// Last non-empty path segment of `url`, percent-decoded.
pub(crate) fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let decoded = percent_decode(last);
    (!decoded.trim().is_empty()).then_some(decoded)
}

fn percent_decode(value: &str) -> String {
    let bytes = urlencoding::decode_binary(value.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Makes a candidate name safe to create on common filesystems.
///
/// Replaces `< > : " / \ | ? *` with `_`, drops control characters, trims
/// trailing spaces and periods, limits the base to 150 characters and
/// prefixes reserved device names with `_`. An empty result becomes
/// `"file"`. Applying it twice gives the same name as applying it once.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .filter(|c| !is_control(*c))
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();

    let trimmed = trim_trailing(&replaced);
    if trimmed.is_empty() {
        return PLACEHOLDER_FILENAME.to_string();
    }

    let (base, extension) = match split_extension(trimmed) {
        // A cut leaving only dots would merge the extension into the base
        // on the next pass, so such names are truncated as a whole.
        (base, _)
            if base.chars().count() > MAX_BASE_NAME_CHARS
                && base.chars().take(MAX_BASE_NAME_CHARS).all(|c| c == '.') =>
        {
            (trimmed, "")
        }
        parts => parts,
    };
    let mut base: Cow<'_, str> = if base.chars().count() > MAX_BASE_NAME_CHARS {
        Cow::Owned(base.chars().take(MAX_BASE_NAME_CHARS).collect())
    } else {
        Cow::Borrowed(base)
    };
    if extension.is_empty() {
        // The cut may have exposed trailing spaces or periods.
        let retrimmed = trim_trailing(&base);
        if retrimmed.is_empty() {
            return PLACEHOLDER_FILENAME.to_string();
        }
        base = Cow::Owned(retrimmed.to_string());
    }

    if is_reserved_name(&base) {
        format!("_{base}{extension}")
    } else {
        format!("{base}{extension}")
    }
}

fn is_control(c: char) -> bool {
    let code = u32::from(c);
    code <= 31 || code == 127
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches([' ', '.'])
}

fn is_reserved_name(base: &str) -> bool {
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(base))
}

/// Splits `name` into base and extension at the last `.`.
///
/// Leading dots never start an extension, so `.env` has none and `..a`
/// neither.
pub(crate) fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if !name[..pos].chars().all(|c| c == '.') => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

/// Returns `dir/name` if nothing exists there, else the first free
/// `dir/base (n)ext` for n = 1, 2, ...
#[must_use]
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !entry_exists(&candidate) {
        return candidate;
    }

    let (base, extension) = split_extension(name);
    let mut counter: u64 = 1;
    loop {
        let candidate = dir.join(format!("{base} ({counter}){extension}"));
        if !entry_exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

// Does not follow symlinks: a dangling link still occupies the name.
fn entry_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Hands out destination files so that no two downloads share a path.
///
/// Probing and creation happen under one async lock; files are created
/// with create-new semantics, and a name taken by another process in the
/// meantime is probed again.
#[derive(Debug, Default)]
pub struct PathAllocator {
    lock: Mutex<()>,
}

impl PathAllocator {
    /// Creates an allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty file for `name` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] if the file cannot be created.
    pub async fn reserve(&self, dir: &Path, name: &str) -> Result<(PathBuf, File), DownloadError> {
        let _guard = self.lock.lock().await;
        loop {
            let path = unique_path(dir, name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    debug!(path = %path.display(), "reserved destination file");
                    return Ok((path, file));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    trace!(path = %path.display(), "path taken concurrently, probing again");
                }
                Err(e) => return Err(DownloadError::io(path, e)),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_filename_replaces_invalid_chars() {
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_filename("file:name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file<name>.pdf"), "file_name_.pdf");
        assert_eq!(sanitize_filename("what?*|\".pdf"), "what____.pdf");
    }

    #[test]
    fn test_sanitize_filename_removes_control_chars() {
        assert_eq!(sanitize_filename("a\u{0}b\tc\u{7f}.txt"), "abc.txt");
    }

    #[test]
    fn test_sanitize_filename_blank_becomes_placeholder() {
        assert_eq!(sanitize_filename("   "), "file");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename(" . ."), "file");
    }

    #[test]
    fn test_sanitize_filename_trims_trailing_spaces_and_periods() {
        assert_eq!(sanitize_filename("report.pdf. "), "report.pdf");
        assert_eq!(sanitize_filename("  lead.txt"), "  lead.txt");
    }

    #[test]
    fn test_sanitize_filename_prefixes_reserved_names() {
        assert_eq!(sanitize_filename("CON.txt"), "_CON.txt");
        assert_eq!(sanitize_filename("con"), "_con");
        assert_eq!(sanitize_filename("Lpt9.log"), "_Lpt9.log");
        assert_eq!(sanitize_filename("CONSOLE.txt"), "CONSOLE.txt");
        assert_eq!(sanitize_filename("COM10"), "COM10");
    }

    #[test]
    fn test_sanitize_filename_truncates_long_base() {
        let long = format!("{}.pdf", "x".repeat(300));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized, format!("{}.pdf", "x".repeat(150)));
    }

    #[test]
    fn test_sanitize_filename_truncation_counts_chars_not_bytes() {
        let long = "é".repeat(200);
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.chars().count(), 150);
    }

    #[test]
    fn test_sanitize_filename_long_leading_dots_truncate_as_whole() {
        let name = format!("{}a.txt", ".".repeat(200));
        assert_eq!(sanitize_filename(&name), "file");

        let name = format!("{}a.txt", ".".repeat(100));
        assert_eq!(sanitize_filename(&name), name);
    }

    #[test]
    fn test_sanitize_filename_dotfile_has_no_extension() {
        assert_eq!(sanitize_filename(".env"), ".env");
        assert_eq!(split_extension(".env"), (".env", ""));
        assert_eq!(split_extension("..a"), ("..a", ""));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_extension("noext"), ("noext", ""));
    }

    #[test]
    fn test_sanitize_filename_is_idempotent() {
        let inputs = [
            "CON.txt",
            "a/b\\c",
            "   ",
            "report.pdf. ",
            ".env",
            "nul",
            "日本語.pdf",
            "a\u{1}b..",
            &format!("{}. .txt", "y".repeat(149)),
            &format!("CON{}x", " ".repeat(147)),
            &"z. ".repeat(80),
            &format!("{}a.txt", ".".repeat(200)),
            &format!("{}b.pdf", ".".repeat(150)),
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            let twice = sanitize_filename(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_parse_content_disposition_extended_is_decoded() {
        let header = "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf";
        assert_eq!(
            parse_content_disposition(header),
            Some("résumé.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_extended_wins_over_plain() {
        let header = "attachment; filename=\"plain.pdf\"; filename*=UTF-8''fancy%20name.pdf";
        assert_eq!(
            parse_content_disposition(header),
            Some("fancy name.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_quoted_and_bare() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="report.csv"; size=12"#),
            Some("report.csv".to_string())
        );
        assert_eq!(
            parse_content_disposition("attachment; filename= data.json ; x=1"),
            Some("data.json".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_is_case_insensitive() {
        assert_eq!(
            parse_content_disposition("ATTACHMENT; FILENAME=\"Upper.PDF\""),
            Some("Upper.PDF".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_invalid_utf8_is_replaced() {
        let name = parse_content_disposition("attachment; filename*=UTF-8''bad%FF.txt").unwrap();
        assert_eq!(name, "bad\u{fffd}.txt");
    }

    #[test]
    fn test_parse_content_disposition_missing_or_blank() {
        assert_eq!(parse_content_disposition("attachment"), None);
        assert_eq!(parse_content_disposition("attachment; filename=\"   \""), None);
        assert_eq!(parse_content_disposition("inline; filename="), None);
    }

    #[test]
    fn test_resolve_name_falls_back_to_url_segment() {
        assert_eq!(resolve_name("https://a.example/docs/paper.pdf", None), "paper.pdf");
        assert_eq!(
            resolve_name("https://a.example/docs/my%20file.pdf?token=abc", None),
            "my file.pdf"
        );
        assert_eq!(
            resolve_name("https://a.example/docs/x.pdf", Some("inline")),
            "x.pdf"
        );
    }

    #[test]
    fn test_resolve_name_placeholder_when_nothing_usable() {
        assert_eq!(resolve_name("https://a.example/", None), "file");
        assert_eq!(resolve_name("https://a.example", None), "file");
        assert_eq!(resolve_name("not a url", None), "file");
    }

    #[test]
    fn test_resolve_name_sanitizes_header_value() {
        assert_eq!(
            resolve_name("https://a.example/x", Some("attachment; filename=\"../../etc/passwd\"")),
            ".._.._etc_passwd"
        );
    }

    #[test]
    fn test_unique_path_no_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let path = unique_path(temp_dir.path(), "a.txt");
        assert_eq!(path, temp_dir.path().join("a.txt"));
    }

    #[test]
    fn test_unique_path_with_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), b"1").unwrap();
        assert_eq!(
            unique_path(temp_dir.path(), "a.txt"),
            temp_dir.path().join("a (1).txt")
        );

        std::fs::write(temp_dir.path().join("a (1).txt"), b"2").unwrap();
        assert_eq!(
            unique_path(temp_dir.path(), "a.txt"),
            temp_dir.path().join("a (2).txt")
        );
    }

    #[test]
    fn test_unique_path_dotfile_suffix_goes_after_name() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".env"), b"1").unwrap();
        assert_eq!(
            unique_path(temp_dir.path(), ".env"),
            temp_dir.path().join(".env (1)")
        );
    }

    #[tokio::test]
    async fn test_path_allocator_never_hands_out_same_path() {
        let temp_dir = TempDir::new().unwrap();
        let allocator = PathAllocator::new();

        let (first, _f1) = allocator.reserve(temp_dir.path(), "x.pdf").await.unwrap();
        let (second, _f2) = allocator.reserve(temp_dir.path(), "x.pdf").await.unwrap();

        assert_eq!(first, temp_dir.path().join("x.pdf"));
        assert_eq!(second, temp_dir.path().join("x (1).pdf"));
        assert!(first.exists() && second.exists());
    }

    #[tokio::test]
    async fn test_path_allocator_missing_dir_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let result = PathAllocator::new().reserve(&missing, "x.pdf").await;
        assert!(matches!(result, Err(DownloadError::Io { .. })));
    }
}
