//! Integration tests for the single-URL download path.
//!
//! These tests drive `HttpClient` and `download_with_retry` against mock
//! HTTP servers and check what lands on disk.

use std::time::Duration;

use csv_downloader_core::download::{
    DownloadError, DownloadOutcome, DownloadTarget, HttpClient, PathAllocator, RateLimiter,
    RetryPolicy, download_with_retry,
};
use csv_downloader_core::parser::UrlRecord;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn test_client() -> HttpClient {
    HttpClient::new(Duration::from_secs(5), None).expect("client should build")
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(10))
}

#[tokio::test]
async fn test_download_full_flow_preserves_content() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = b"This is the complete file content for testing.\nLine 2.\nLine 3.";
    Mock::given(method("GET"))
        .and(path("/document.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/document.pdf", mock_server.uri());
    let result = test_client()
        .download_to_file(
            &url,
            temp_dir.path(),
            &PathAllocator::new(),
            &CancellationToken::new(),
        )
        .await
        .expect("download should succeed");

    assert_eq!(result.path, temp_dir.path().join("document.pdf"));
    assert_eq!(result.bytes_written, content.len() as u64);
    let downloaded = std::fs::read(&result.path).expect("should read file");
    assert_eq!(downloaded, content);
}

#[tokio::test]
async fn test_download_extended_content_disposition_is_decoded() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/cv"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Content-Disposition",
                    "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf",
                )
                .set_body_bytes(b"cv bytes".to_vec()),
        )
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/api/cv", mock_server.uri());
    let result = test_client()
        .download_to_file(
            &url,
            temp_dir.path(),
            &PathAllocator::new(),
            &CancellationToken::new(),
        )
        .await
        .expect("download should succeed");

    assert_eq!(result.path.file_name().unwrap(), "résumé.pdf");
}

#[tokio::test]
async fn test_download_name_comes_from_path_not_query() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/files/My%20Report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"report".to_vec()))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/files/My%20Report.pdf?name=other.bin", mock_server.uri());
    let result = test_client()
        .download_to_file(
            &url,
            temp_dir.path(),
            &PathAllocator::new(),
            &CancellationToken::new(),
        )
        .await
        .expect("download should succeed");

    assert_eq!(result.path.file_name().unwrap(), "My Report.pdf");
}

#[tokio::test]
async fn test_download_server_error_is_http_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/broken", mock_server.uri());
    let error = test_client()
        .download_to_file(
            &url,
            temp_dir.path(),
            &PathAllocator::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, DownloadError::HttpStatus { status: 500, .. }));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/flaky.txt"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"finally".to_vec()))
        .with_priority(2)
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = UrlRecord::new(&format!("{}/flaky.txt", mock_server.uri())).unwrap();
    let target = DownloadTarget::new(url, temp_dir.path());
    let outcome = download_with_retry(
        &test_client(),
        &target,
        &fast_policy(3),
        &RateLimiter::disabled(),
        &PathAllocator::new(),
        &CancellationToken::new(),
    )
    .await;

    match outcome {
        DownloadOutcome::Success {
            bytes_written,
            path,
            ..
        } => {
            assert_eq!(bytes_written, 7);
            assert_eq!(std::fs::read(path).unwrap(), b"finally");
        }
        DownloadOutcome::Failure { error, .. } => panic!("expected success, got {error}"),
    }
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_retry_gives_up_after_max_attempts() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = UrlRecord::new(&format!("{}/down", mock_server.uri())).unwrap();
    let target = DownloadTarget::new(url, temp_dir.path());
    let outcome = download_with_retry(
        &test_client(),
        &target,
        &fast_policy(2),
        &RateLimiter::disabled(),
        &PathAllocator::new(),
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(
        outcome,
        DownloadOutcome::Failure {
            error: DownloadError::HttpStatus { status: 502, .. },
            ..
        }
    ));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_retry_skips_permanent_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = UrlRecord::new(&format!("{}/missing", mock_server.uri())).unwrap();
    let target = DownloadTarget::new(url, temp_dir.path());
    let outcome = download_with_retry(
        &test_client(),
        &target,
        &fast_policy(5),
        &RateLimiter::disabled(),
        &PathAllocator::new(),
        &CancellationToken::new(),
    )
    .await;

    assert!(!outcome.is_success());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_cancelled_during_backoff() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/slow-recovery"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = UrlRecord::new(&format!("{}/slow-recovery", mock_server.uri())).unwrap();
    let target = DownloadTarget::new(url, temp_dir.path());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let outcome = download_with_retry(
        &test_client(),
        &target,
        &RetryPolicy::new(5, Duration::from_secs(30)),
        &RateLimiter::disabled(),
        &PathAllocator::new(),
        &cancel,
    )
    .await;

    assert!(matches!(
        outcome,
        DownloadOutcome::Failure {
            error: DownloadError::Cancelled { .. },
            ..
        }
    ));
}
