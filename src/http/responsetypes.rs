//! Response type inference
//!
//! Picks the most specific [`ResponseKind`] for a payload from whatever is
//! known about it: a media type, a file name, or the body itself.

use std::fmt;
use std::path::Path;

/// Number of leading body bytes examined when sniffing
const SNIFF_LEN: usize = 5000;

/// Kind of a downloaded response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Opaque bytes
    Binary,
    /// Plain text
    Text,
    /// HTML or XHTML document
    Html,
    /// XML document (including feeds)
    Xml,
    /// JSON document
    Json,
}

/// Media types with a dedicated kind. Anything else under `text/` is `Text`.
const MIMETYPE_KINDS: &[(&str, ResponseKind)] = &[
    ("text/html", ResponseKind::Html),
    ("application/xhtml+xml", ResponseKind::Html),
    ("application/vnd.wap.xhtml+xml", ResponseKind::Html),
    ("text/xml", ResponseKind::Xml),
    ("application/xml", ResponseKind::Xml),
    ("application/atom+xml", ResponseKind::Xml),
    ("application/rdf+xml", ResponseKind::Xml),
    ("application/rss+xml", ResponseKind::Xml),
    ("application/json", ResponseKind::Json),
    ("application/x-json", ResponseKind::Json),
    ("application/javascript", ResponseKind::Text),
    ("application/x-javascript", ResponseKind::Text),
    ("application/json-amazonui-streaming", ResponseKind::Text),
];

/// File extension to media type
const EXTENSION_MIMETYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("shtml", "text/html"),
    ("xhtml", "application/xhtml+xml"),
    ("xht", "application/xhtml+xml"),
    ("xml", "text/xml"),
    ("xsl", "application/xml"),
    ("xsd", "application/xml"),
    ("rss", "application/rss+xml"),
    ("atom", "application/atom+xml"),
    ("rdf", "application/rdf+xml"),
    ("json", "application/json"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("log", "text/plain"),
    ("conf", "text/plain"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("css", "text/css"),
    ("md", "text/markdown"),
    ("py", "text/x-python"),
    ("c", "text/x-c"),
    ("h", "text/x-c"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("tar", "application/x-tar"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("bin", "application/octet-stream"),
];

/// Suffixes that denote a content encoding rather than a media type
const ENCODING_SUFFIXES: &[&str] = &["gz", "bz2", "xz", "br", "Z"];

impl ResponseKind {
    /// Map a media type (parameters allowed) to a response kind
    pub fn from_mimetype(mimetype: &str) -> Self {
        let essence = mimetype
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if let Some((_, kind)) = MIMETYPE_KINDS.iter().find(|(m, _)| *m == essence) {
            return *kind;
        }

        if essence.starts_with("text/") {
            ResponseKind::Text
        } else {
            ResponseKind::Binary
        }
    }

    /// Guess a response kind from a file name
    ///
    /// A compressed file (`page.html.gz`) is always binary, whatever the
    /// inner extension says.
    pub fn from_filename(filename: impl AsRef<Path>) -> Self {
        let path = filename.as_ref();
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext,
            None => return ResponseKind::Binary,
        };

        if ENCODING_SUFFIXES.contains(&ext) {
            return ResponseKind::Binary;
        }

        let ext = ext.to_ascii_lowercase();
        EXTENSION_MIMETYPES
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, mimetype)| Self::from_mimetype(mimetype))
            .unwrap_or(ResponseKind::Binary)
    }

    /// Guess a response kind by sniffing the start of a body
    pub fn from_body(body: &[u8]) -> Self {
        let chunk = &body[..body.len().min(SNIFF_LEN)];

        if !is_text(chunk) {
            return Self::from_mimetype("application/octet-stream");
        }

        let lower = chunk.to_ascii_lowercase();
        if contains(&lower, b"<html>") {
            ResponseKind::Html
        } else if contains(&lower, b"<?xml") {
            ResponseKind::Xml
        } else if contains(&lower, b"<!doctype html>") {
            ResponseKind::Html
        } else {
            ResponseKind::Text
        }
    }

    /// Guess a response kind from everything that is known
    ///
    /// The file name wins when it is specific. Otherwise the body is
    /// sniffed, so an empty body reads as `Text`.
    pub fn from_args(filename: Option<&Path>, body: &[u8]) -> Self {
        let mut kind = ResponseKind::Binary;

        if let Some(filename) = filename {
            kind = Self::from_filename(filename);
        }

        if kind == ResponseKind::Binary {
            kind = Self::from_body(body);
        }

        kind
    }

    /// Check whether bodies of this kind are text
    pub fn is_text(&self) -> bool {
        !matches!(self, ResponseKind::Binary)
    }

    /// Get kind as string
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Binary => "binary",
            ResponseKind::Text => "text",
            ResponseKind::Html => "html",
            ResponseKind::Xml => "xml",
            ResponseKind::Json => "json",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Control characters that mark data as binary. NUL, TAB, LF and CR are
/// tolerated.
fn is_binary_byte(b: u8) -> bool {
    b < 32 && !matches!(b, b'\0' | b'\t' | b'\n' | b'\r')
}

fn is_text(data: &[u8]) -> bool {
    !data.iter().copied().any(is_binary_byte)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
