//! `file://` download handler
//!
//! Reads local files synchronously. Each call does exactly one read of the
//! whole file; nothing is cached between calls.

use super::{DownloadHandler, HandlerError};
use crate::http::{Request, Response, ResponseKind};
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};

/// Local fetch errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid file URL: {0}")]
    InvalidLocator(String),

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One completed local read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFetchResult {
    locator: String,
    path: PathBuf,
    body: Bytes,
    kind: ResponseKind,
}

impl LocalFetchResult {
    /// Get the locator as requested
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Get the filesystem path the locator resolved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file contents
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the inferred response kind
    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// Convert into a response for the original locator
    pub fn into_response(self) -> Response {
        Response::new(self.locator, self.body, self.kind)
    }
}

/// Handler for the `file` scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDownloadHandler;

impl FileDownloadHandler {
    /// Usable as soon as it is registered
    pub const LAZY: bool = false;

    /// Create a new handler
    pub fn new() -> Self {
        FileDownloadHandler
    }

    /// Read the file `locator` points at
    pub fn fetch(&self, locator: &str) -> Result<LocalFetchResult, FetchError> {
        let path = file_uri_to_path(locator)?;

        let body = std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound { path: path.clone() },
            _ => FetchError::Read {
                path: path.clone(),
                source: e,
            },
        })?;

        let kind = ResponseKind::from_args(Some(path.as_path()), &body);
        log::trace!("Read {} bytes from {} as {}", body.len(), path.display(), kind);

        Ok(LocalFetchResult {
            locator: locator.to_string(),
            path,
            body: Bytes::from(body),
            kind,
        })
    }
}

impl DownloadHandler for FileDownloadHandler {
    fn download_request(&self, request: &Request) -> Result<Response, HandlerError> {
        Ok(self.fetch(request.url())?.into_response())
    }
}

/// Convert a `file://` URL to a local path
///
/// Percent-encoded bytes are decoded. A host other than empty or
/// `localhost` is rejected.
pub fn file_uri_to_path(locator: &str) -> Result<PathBuf, FetchError> {
    let invalid = || FetchError::InvalidLocator(locator.to_string());

    let url = url::Url::parse(locator).map_err(|_| invalid())?;
    if url.scheme() != "file" {
        return Err(invalid());
    }

    url.to_file_path().map_err(|()| invalid())
}
