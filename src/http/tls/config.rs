//! TLS configuration
//!
//! This module provides the client configuration builder, the protocol
//! method selection and the shared cipher preference.

use super::hostname::VerifyError;
use super::policy::ClientTlsOptions;
use super::session::TlsSession;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode, SslVersion};
use std::borrow::Cow;
use std::net::TcpStream;

/// TLS protocol method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMethod {
    /// Negotiate the highest version both sides support
    #[default]
    Tls,
    /// TLS 1.0 only
    Tls10,
    /// TLS 1.1 only
    Tls11,
    /// TLS 1.2 only
    Tls12,
}

impl TlsMethod {
    /// Parse a method name (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, TlsError> {
        match s.to_uppercase().as_str() {
            "TLS" => Ok(TlsMethod::Tls),
            "TLSV1.0" | "TLSV1" => Ok(TlsMethod::Tls10),
            "TLSV1.1" => Ok(TlsMethod::Tls11),
            "TLSV1.2" => Ok(TlsMethod::Tls12),
            _ => Err(TlsError::InvalidMethod(s.to_string())),
        }
    }

    /// Get method name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsMethod::Tls => "TLS",
            TlsMethod::Tls10 => "TLSv1.0",
            TlsMethod::Tls11 => "TLSv1.1",
            TlsMethod::Tls12 => "TLSv1.2",
        }
    }

    /// Get the pinned OpenSSL protocol version, if any
    fn to_openssl_version(self) -> Option<SslVersion> {
        match self {
            TlsMethod::Tls => None,
            TlsMethod::Tls10 => Some(SslVersion::TLS1),
            TlsMethod::Tls11 => Some(SslVersion::TLS1_1),
            TlsMethod::Tls12 => Some(SslVersion::TLS1_2),
        }
    }

    fn apply(self, ctx: &mut SslContextBuilder) -> Result<(), TlsError> {
        if let Some(version) = self.to_openssl_version() {
            ctx.set_min_proto_version(Some(version))?;
            ctx.set_max_proto_version(Some(version))?;
        }
        Ok(())
    }
}

/// What to do when the peer certificate does not match the hostname
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Log a warning and keep the connection
    #[default]
    WarnOnly,
    /// Fail the handshake
    Strict,
}

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TLS method: {0}")]
    InvalidMethod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Certificate verification failed: {0}")]
    Verification(#[from] VerifyError),
}

/// Acceptable cipher list, validated by OpenSSL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherPreference {
    list: Cow<'static, str>,
}

/// The engine's default cipher ordering, shared by every connection
pub static DEFAULT_CIPHERS: CipherPreference = CipherPreference {
    list: Cow::Borrowed("DEFAULT"),
};

impl CipherPreference {
    /// Parse an OpenSSL cipher list string
    ///
    /// Fails if OpenSSL does not recognise any cipher in the list.
    pub fn parse(list: &str) -> Result<Self, TlsError> {
        let mut scratch = SslContextBuilder::new(SslMethod::tls_client())?;
        scratch.set_cipher_list(list)?;
        Ok(CipherPreference {
            list: Cow::Owned(list.to_string()),
        })
    }

    /// Get the cipher list string
    pub fn as_str(&self) -> &str {
        &self.list
    }

    fn apply(&self, ctx: &mut SslContextBuilder) -> Result<(), TlsError> {
        ctx.set_cipher_list(&self.list)?;
        Ok(())
    }
}

impl Default for CipherPreference {
    fn default() -> Self {
        DEFAULT_CIPHERS.clone()
    }
}

/// Client TLS configuration (immutable after building)
#[derive(Clone)]
pub struct TlsConfig {
    pub(crate) ctx: SslContext,
    pub(crate) method: TlsMethod,
    pub(crate) verbose_logging: bool,
    pub(crate) trust_policy: TrustPolicy,
}

impl TlsConfig {
    /// Create a new client configuration builder
    pub fn client() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Create the per-connection verification policy for `hostname`
    pub fn creator_for_netloc(&self, hostname: &str) -> Result<ClientTlsOptions, TlsError> {
        Ok(ClientTlsOptions::new(hostname, self.verbose_logging)?
            .with_trust_policy(self.trust_policy))
    }

    /// Connect to `hostname` over an established TCP stream
    pub fn connect(&self, hostname: &str, stream: TcpStream) -> Result<TlsSession, TlsError> {
        let options = self.creator_for_netloc(hostname)?;
        TlsSession::connect(stream, &self.ctx, &options)
    }

    /// Get the configured protocol method
    pub fn method(&self) -> TlsMethod {
        self.method
    }

    /// Check whether verbose handshake logging is enabled
    pub fn verbose_logging(&self) -> bool {
        self.verbose_logging
    }

    /// Get the trust policy applied to hostname verification failures
    pub fn trust_policy(&self) -> TrustPolicy {
        self.trust_policy
    }
}

/// Client configuration builder
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    method: TlsMethod,
    ciphers: CipherPreference,
    verbose_logging: bool,
    trust_policy: TrustPolicy,
    verify_peer: bool,
    alpn: Vec<String>,
}

impl ClientConfigBuilder {
    fn new() -> Self {
        ClientConfigBuilder {
            method: TlsMethod::default(),
            ciphers: CipherPreference::default(),
            verbose_logging: false,
            trust_policy: TrustPolicy::default(),
            // Chain validation is left to the policy's hostname check
            verify_peer: false,
            alpn: Vec::new(),
        }
    }

    /// Set the protocol method
    pub fn method(mut self, method: TlsMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the acceptable ciphers
    pub fn ciphers(mut self, ciphers: CipherPreference) -> Self {
        self.ciphers = ciphers;
        self
    }

    /// Log protocol, cipher, certificate and key details after each handshake
    pub fn verbose_logging(mut self, enabled: bool) -> Self {
        self.verbose_logging = enabled;
        self
    }

    /// Set how hostname verification failures are handled
    pub fn trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.trust_policy = policy;
        self
    }

    /// Enable/disable certificate chain verification against the system CAs
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    /// Set ALPN protocols, in preference order
    pub fn alpn(mut self, protocols: &[&str]) -> Self {
        self.alpn = protocols.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Build the TLS configuration
    pub fn build(self) -> Result<TlsConfig, TlsError> {
        let mut ctx = SslContextBuilder::new(SslMethod::tls_client())?;

        self.method.apply(&mut ctx)?;
        self.ciphers.apply(&mut ctx)?;

        if self.verify_peer {
            ctx.set_default_verify_paths()?;
            ctx.set_verify(SslVerifyMode::PEER);
        } else {
            ctx.set_verify(SslVerifyMode::NONE);
        }

        if !self.alpn.is_empty() {
            ctx.set_alpn_protos(&encode_alpn(&self.alpn)?)?;
        }

        Ok(TlsConfig {
            ctx: ctx.build(),
            method: self.method,
            verbose_logging: self.verbose_logging,
            trust_policy: self.trust_policy,
        })
    }
}

/// Encode ALPN protocols in wire format (length-prefixed)
fn encode_alpn(protocols: &[String]) -> Result<Vec<u8>, TlsError> {
    let mut wire = Vec::new();
    for proto in protocols {
        let len = u8::try_from(proto.len())
            .ok()
            .filter(|len| *len > 0)
            .ok_or_else(|| TlsError::InvalidConfig(format!("Invalid ALPN protocol: {:?}", proto)))?;
        wire.push(len);
        wire.extend_from_slice(proto.as_bytes());
    }
    Ok(wire)
}
