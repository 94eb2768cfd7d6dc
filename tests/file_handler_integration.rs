//! Local file download integration tests
//!
//! Covers reading through `FileDownloadHandler` directly and dispatching
//! `file://` requests through the default handler table.

use crawlnet::handlers::{DownloadHandlers, FetchError, FileDownloadHandler, HandlerError};
use crawlnet::http::{Request, ResponseKind, DEFAULT_STATUS};
use std::fs;
use std::path::Path;
use url::Url;

fn file_url(path: &Path) -> String {
    Url::from_file_path(path).unwrap().to_string()
}

#[test]
fn test_fetch_text_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, b"first line\nsecond line\n").unwrap();

    let result = FileDownloadHandler::new().fetch(&file_url(&path)).unwrap();

    assert_eq!(result.body().as_ref(), b"first line\nsecond line\n");
    assert_eq!(result.kind(), ResponseKind::Text);
    assert_eq!(result.path(), path.as_path());
}

#[test]
fn test_fetch_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(&path, br#"{"items": [1, 2, 3]}"#).unwrap();
    let locator = file_url(&path);

    let handler = FileDownloadHandler::new();
    let first = handler.fetch(&locator).unwrap();
    let second = handler.fetch(&locator).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.kind(), ResponseKind::Json);
}

#[test]
fn test_fetch_sees_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.txt");
    let locator = file_url(&path);
    let handler = FileDownloadHandler::new();

    fs::write(&path, b"before").unwrap();
    assert_eq!(handler.fetch(&locator).unwrap().body().as_ref(), b"before");

    fs::write(&path, b"after").unwrap();
    assert_eq!(handler.fetch(&locator).unwrap().body().as_ref(), b"after");
}

#[test]
fn test_fetch_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.bin");

    let err = FileDownloadHandler::new().fetch(&file_url(&path)).unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }), "{}", err);
}

#[test]
fn test_fetch_invalid_locator() {
    let err = FileDownloadHandler::new().fetch("not-a-file-url").unwrap_err();
    assert!(matches!(err, FetchError::InvalidLocator(_)), "{}", err);
}

#[test]
fn test_fetch_percent_encoded_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("with space.html");
    fs::write(&path, b"<html><body>hi</body></html>").unwrap();

    let locator = file_url(&path);
    assert!(locator.contains("with%20space.html"));

    let result = FileDownloadHandler::new().fetch(&locator).unwrap();
    assert_eq!(result.kind(), ResponseKind::Html);
    assert_eq!(result.locator(), locator);
}

#[test]
fn test_binary_content_without_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob");
    fs::write(&path, [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x01]).unwrap();

    let result = FileDownloadHandler::new().fetch(&file_url(&path)).unwrap();
    assert_eq!(result.kind(), ResponseKind::Binary);
}

#[test]
fn test_empty_file_without_extension_is_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("EMPTY");
    fs::write(&path, b"").unwrap();

    let result = FileDownloadHandler::new().fetch(&file_url(&path)).unwrap();
    assert!(result.body().is_empty());
    assert_eq!(result.kind(), ResponseKind::Text);
}

#[test]
fn test_dispatch_through_default_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.xml");
    fs::write(&path, b"<?xml version=\"1.0\"?><rss></rss>").unwrap();

    let handlers = DownloadHandlers::with_defaults();
    let request = Request::new(file_url(&path));
    let response = handlers.download_request(&request).unwrap();

    assert_eq!(response.url(), request.url());
    assert_eq!(response.status(), DEFAULT_STATUS);
    assert_eq!(response.kind(), ResponseKind::Xml);
    assert_eq!(response.body().as_ref(), b"<?xml version=\"1.0\"?><rss></rss>");
}

#[test]
fn test_dispatch_missing_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::new(file_url(&dir.path().join("gone.txt")));

    let err = DownloadHandlers::with_defaults()
        .download_request(&request)
        .unwrap_err();
    assert!(matches!(err, HandlerError::Fetch(FetchError::NotFound { .. })), "{}", err);
}
