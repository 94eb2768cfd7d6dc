//! crawlnet - downloader plumbing for a web crawler
//!
//! This crate provides the TLS client policy used for outbound HTTPS
//! connections and the download handlers that serve non-network schemes
//! such as `file://`.

pub mod handlers;
pub mod http;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
pub(crate) mod test_support;
