//! Request/response model shared by the download handlers
//!
//! # Architecture
//!
//! A download handler turns a [`Request`] into a [`Response`]. The response
//! carries a [`ResponseKind`] inferred from the file name, the media type or
//! the body, so callers can decide how to decode it without inspecting
//! bytes themselves.
//!
//! Outbound HTTPS connections are set up through [`tls::TlsConfig`], which
//! installs a lenient verification policy on every handshake.
//!
//! # Examples
//!
//! ```no_run
//! use crawlnet::handlers::DownloadHandlers;
//! use crawlnet::http::{Request, ResponseKind};
//!
//! let handlers = DownloadHandlers::with_defaults();
//! let response = handlers
//!     .download_request(&Request::new("file:///etc/hostname"))
//!     .unwrap();
//! assert_eq!(response.kind(), ResponseKind::Text);
//! ```

pub mod message;
pub mod responsetypes;
pub mod tls;

pub use message::{Request, Response};
pub use responsetypes::ResponseKind;

/// Status code reported for responses that did not come from a server
pub const DEFAULT_STATUS: u16 = 200;
