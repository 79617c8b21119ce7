//! HTTP client wrapper for downloading files.
//!
//! This module provides the `HttpClient` struct which handles a single
//! streaming download attempt with timeout, proxy and cancellation support.
//! Retries live one level up in [`super::executor`].

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Proxy};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{USER_AGENT, WRITE_BUFFER_BYTES};
use super::error::DownloadError;
use super::filename::{PathAllocator, resolve_name};
use crate::config::BatchOptions;

/// HTTP client for downloading files with streaming support.
///
/// This client is designed to be created once and reused for every URL of
/// a batch, taking advantage of connection pooling. The timeout applies to
/// connecting and to each read; a slow but steady body is never cut off.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use std::time::Duration;
/// use csv_downloader_core::download::{HttpClient, PathAllocator};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(Duration::from_secs(30), None)?;
/// let allocator = PathAllocator::new();
/// let result = client
///     .download_to_file(
///         "https://example.com/file.pdf",
///         Path::new("./downloads"),
///         &allocator,
///         &CancellationToken::new(),
///     )
///     .await?;
/// println!("Downloaded {} bytes to {}", result.bytes_written, result.path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// Result of one successful download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFileResult {
    /// Final path of the written file.
    pub path: PathBuf,
    /// Number of body bytes written (always > 0).
    pub bytes_written: u64,
}

impl HttpClient {
    /// Creates a client with the given connect/read timeout and optional proxy.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the proxy URL is rejected or the TLS
    /// backend cannot be initialized.
    pub fn new(timeout: Duration, proxy_url: Option<&str>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .gzip(true)
            .user_agent(USER_AGENT);
        if let Some(proxy_url) = proxy_url {
            debug!(proxy = %proxy_url, "routing requests through proxy");
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Creates a client from batch options (timeout and proxy).
    ///
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn from_options(options: &BatchOptions) -> Result<Self, reqwest::Error> {
        Self::new(options.timeout(), options.proxy_url.as_deref())
    }

    /// Performs one download attempt of `url` into `output_dir`.
    ///
    /// The file is named from the `Content-Disposition` header or the URL
    /// and created through `allocator`, so it never replaces an existing
    /// file. A body that fails mid-stream, is cancelled, or turns out empty
    /// leaves no file behind.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] describing why the attempt failed.
    #[instrument(skip(self, output_dir, allocator, cancel), fields(url = %url))]
    pub async fn download_to_file(
        &self,
        url: &str,
        output_dir: &Path,
        allocator: &PathAllocator,
        cancel: &CancellationToken,
    ) -> Result<DownloadFileResult, DownloadError> {
        debug!("starting download");

        let parsed_url = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        let response = self.send_request(parsed_url, url, cancel).await?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .map(|v| header_text(v.as_bytes()));
        let filename = resolve_name(url, content_disposition.as_deref());

        let (file_path, file) = allocator.reserve(output_dir, &filename).await?;
        debug!(filename = %filename, path = %file_path.display(), "resolved output path");

        let stream_result = stream_to_file(file, response, url, &file_path, cancel).await;

        let bytes_written = match stream_result {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %file_path.display(), "cleaning up partial file after error");
                remove_best_effort(&file_path).await;
                return Err(e);
            }
        };

        if bytes_written == 0 {
            remove_best_effort(&file_path).await;
            return Err(DownloadError::empty_content(url));
        }

        info!(path = %file_path.display(), bytes = bytes_written, "download complete");

        Ok(DownloadFileResult {
            path: file_path,
            bytes_written,
        })
    }

    async fn send_request(
        &self,
        parsed_url: Url,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, DownloadError> {
        let request = self.client.get(parsed_url).send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            result = request => result.map_err(|e| DownloadError::network(url, e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams the response body into `file`, returning bytes written.
///
/// Takes ownership of the file so the handle is closed before the caller
/// cleans up after an error.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

/// Header bytes as text: UTF-8 when valid, otherwise ISO-8859-1.
fn header_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

async fn remove_best_effort(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "could not remove incomplete file");
    }
}
