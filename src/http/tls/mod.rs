//! TLS support for outbound HTTPS connections
//!
//! This module sets up client TLS connections for the downloader. Every
//! connection gets a verification policy that tolerates broken or
//! self-signed certificates. A failed hostname check is reported as a
//! warning and the connection carries on. Optional verbose logging
//! describes the negotiated protocol, the cipher, the peer certificate and
//! the ephemeral key.
//!
//! # Architecture
//!
//! 1. `TlsConfig` owns the OpenSSL context (method, ciphers, ALPN, trust policy)
//! 2. `ClientTlsOptions` is the per-connection `HandshakePolicy`
//! 3. `TlsSession` drives the handshake and calls the policy at handshake
//!    start and handshake done
//!
//! The policy only talks to the connection through `HandshakeConnection`,
//! which is implemented for `openssl::ssl::SslRef`.
//!
//! # Examples
//!
//! ```no_run
//! use crawlnet::http::tls::{TlsConfig, TlsMethod, TrustPolicy};
//! use std::io::Write;
//! use std::net::TcpStream;
//!
//! let tls_config = TlsConfig::client()
//!     .method(TlsMethod::Tls)
//!     .verbose_logging(true)
//!     .trust_policy(TrustPolicy::WarnOnly)
//!     .build()
//!     .unwrap();
//!
//! let tcp_stream = TcpStream::connect("example.com:443").unwrap();
//! let mut session = tls_config.connect("example.com", tcp_stream).unwrap();
//! session.write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! ```

pub mod cert;
pub mod config;
pub mod connection;
pub mod hostname;
pub mod key_info;
pub mod policy;
pub mod session;

pub use cert::{AltName, CertInfo};
pub use config::{
    CipherPreference, ClientConfigBuilder, TlsConfig, TlsError, TlsMethod, TrustPolicy,
    DEFAULT_CIPHERS,
};
pub use connection::HandshakeConnection;
pub use hostname::{verify_alt_names, verify_hostname, VerifyError, VerifyErrorKind};
pub use policy::{ClientTlsOptions, HandshakeEvent, HandshakePolicy};
pub use session::TlsSession;

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;
