//! Request and response types
//!
//! This module defines the messages exchanged between the downloader and
//! its handlers.

use super::{ResponseKind, DEFAULT_STATUS};
use bytes::Bytes;
use std::borrow::Cow;
use std::fmt;

/// Download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: String,
}

impl Request {
    /// Create a new request for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Request { url: url.into() }
    }

    /// Get the request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the lowercased URL scheme, if the URL parses
    pub fn scheme(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .map(|u| u.scheme().to_ascii_lowercase())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.url)
    }
}

/// Download response
///
/// Immutable once built. The body is reference counted, so cloning a
/// response does not copy its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    url: String,
    status: u16,
    body: Bytes,
    kind: ResponseKind,
}

impl Response {
    /// Create a new response with the default status
    pub fn new(url: impl Into<String>, body: impl Into<Bytes>, kind: ResponseKind) -> Self {
        Response {
            url: url.into(),
            status: DEFAULT_STATUS,
            body: body.into(),
            kind,
        }
    }

    /// Override the status code
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Get the URL this response answers
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the raw body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the inferred response kind
    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// Decode the body as text, if the response kind is textual
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        if self.kind.is_text() {
            Some(String::from_utf8_lossy(&self.body))
        } else {
            None
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.status, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_scheme() {
        assert_eq!(Request::new("file:///tmp/x").scheme(), Some("file".to_string()));
        assert_eq!(Request::new("HTTPS://example.com/").scheme(), Some("https".to_string()));
        assert_eq!(Request::new("not-a-file-url").scheme(), None);
    }

    #[test]
    fn test_response_defaults() {
        let resp = Response::new("file:///tmp/a.txt", &b"hello"[..], ResponseKind::Text);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.body().as_ref(), b"hello");
        assert_eq!(resp.to_string(), "<200 file:///tmp/a.txt>");
    }

    #[test]
    fn test_response_text() {
        let text = Response::new("file:///a.html", &b"<html></html>"[..], ResponseKind::Html);
        assert_eq!(text.text().as_deref(), Some("<html></html>"));

        let binary = Response::new("file:///a.bin", vec![0x1b, 0x00], ResponseKind::Binary);
        assert!(binary.text().is_none());
    }
}
