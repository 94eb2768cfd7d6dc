//! Handshake verification policy
//!
//! `ClientTlsOptions` hooks the two handshake checkpoints of a client
//! connection:
//!
//! - at handshake start it sends the target hostname as SNI
//! - at handshake done it optionally logs the negotiated parameters, then
//!   verifies the peer certificate against the hostname
//!
//! With the default [`TrustPolicy::WarnOnly`] a failed hostname check is
//! logged as a warning and the connection is kept, so servers with broken or
//! self-signed certificates can still be crawled. Identity errors and
//! malformed-input errors produce different warnings.

use super::config::{TlsError, TrustPolicy};
use super::connection::HandshakeConnection;
use super::hostname::{verify_alt_names, VerifyErrorKind};
use log::{debug, warn};

/// Info callback bit set when a handshake starts
pub const SSL_CB_HANDSHAKE_START: i32 = 0x10;

/// Info callback bit set when a handshake completes
pub const SSL_CB_HANDSHAKE_DONE: i32 = 0x20;

/// Handshake checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// ClientHello is about to be sent
    Start,
    /// Keys are exchanged and the peer certificate is known
    Done,
}

impl HandshakeEvent {
    /// Decode an info callback `where` bitmask
    ///
    /// Unrelated bits are ignored. Start wins if both bits are set.
    pub fn from_where(where_: i32) -> Option<Self> {
        if where_ & SSL_CB_HANDSHAKE_START != 0 {
            Some(HandshakeEvent::Start)
        } else if where_ & SSL_CB_HANDSHAKE_DONE != 0 {
            Some(HandshakeEvent::Done)
        } else {
            None
        }
    }
}

/// Hooks invoked while a client handshake progresses
pub trait HandshakePolicy {
    /// Called before the ClientHello is sent
    fn on_handshake_start(&self, conn: &mut dyn HandshakeConnection) -> Result<(), TlsError>;

    /// Called once the handshake has completed
    fn on_handshake_done(&self, conn: &dyn HandshakeConnection) -> Result<(), TlsError>;

    /// Dispatch a raw info callback
    ///
    /// `_ret` is part of the engine's callback signature and is not used.
    fn info_callback(
        &self,
        conn: &mut dyn HandshakeConnection,
        where_: i32,
        _ret: i32,
    ) -> Result<(), TlsError> {
        match HandshakeEvent::from_where(where_) {
            Some(HandshakeEvent::Start) => self.on_handshake_start(conn),
            Some(HandshakeEvent::Done) => self.on_handshake_done(&*conn),
            None => Ok(()),
        }
    }
}

/// Client connection policy that downgrades hostname verification failures
/// to warnings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTlsOptions {
    hostname_ascii: String,
    hostname_bytes: Vec<u8>,
    verbose_logging: bool,
    trust_policy: TrustPolicy,
}

impl ClientTlsOptions {
    /// Create the policy for one connection to `hostname`
    ///
    /// ASCII hostnames are kept verbatim, others are IDNA-encoded.
    pub fn new(hostname: &str, verbose_logging: bool) -> Result<Self, TlsError> {
        let hostname_ascii = to_ascii_hostname(hostname)?;
        Ok(ClientTlsOptions {
            hostname_bytes: hostname_ascii.as_bytes().to_vec(),
            hostname_ascii,
            verbose_logging,
            trust_policy: TrustPolicy::default(),
        })
    }

    /// Set the trust policy
    pub fn with_trust_policy(mut self, trust_policy: TrustPolicy) -> Self {
        self.trust_policy = trust_policy;
        self
    }

    /// Get the ASCII hostname
    pub fn hostname(&self) -> &str {
        &self.hostname_ascii
    }

    /// Get the hostname as sent in SNI
    pub fn hostname_bytes(&self) -> &[u8] {
        &self.hostname_bytes
    }

    /// Check whether verbose handshake logging is enabled
    pub fn verbose_logging(&self) -> bool {
        self.verbose_logging
    }

    /// Get the trust policy
    pub fn trust_policy(&self) -> TrustPolicy {
        self.trust_policy
    }

    fn log_connection(&self, conn: &dyn HandshakeConnection) {
        debug!(
            "SSL connection to {} using protocol {}, cipher {}",
            self.hostname_ascii,
            conn.protocol_version_name(),
            conn.cipher_name().as_deref().unwrap_or("<undef>"),
        );

        match conn.peer_cert_info() {
            Ok(Some(cert)) => debug!(
                "SSL connection certificate: issuer \"{}\", subject \"{}\"",
                cert.issuer, cert.subject,
            ),
            Ok(None) => {}
            Err(e) => debug!("SSL connection certificate could not be read: {}", e),
        }

        if let Some(key_info) = conn.temp_key_info() {
            debug!("SSL temp key: {}", key_info);
        }
    }

    fn verify(&self, conn: &dyn HandshakeConnection) -> Result<(), TlsError> {
        let alt_names = conn.peer_alt_names()?;

        let err = match verify_alt_names(alt_names.as_deref(), &self.hostname_ascii) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        if self.trust_policy == TrustPolicy::Strict {
            return Err(TlsError::Verification(err));
        }

        match err.kind() {
            VerifyErrorKind::Certificate | VerifyErrorKind::Verification => {
                warn!(
                    "Remote certificate is not valid for hostname \"{}\"; {}",
                    self.hostname_ascii, err,
                );
            }
            VerifyErrorKind::Value => {
                warn!(
                    "Ignoring error while verifying certificate from host \"{}\" (exception: {:?})",
                    self.hostname_ascii, err,
                );
            }
        }

        Ok(())
    }
}

impl HandshakePolicy for ClientTlsOptions {
    fn on_handshake_start(&self, conn: &mut dyn HandshakeConnection) -> Result<(), TlsError> {
        conn.set_server_name(&self.hostname_bytes)
    }

    fn on_handshake_done(&self, conn: &dyn HandshakeConnection) -> Result<(), TlsError> {
        if self.verbose_logging {
            self.log_connection(conn);
        }

        self.verify(conn)
    }
}

fn to_ascii_hostname(hostname: &str) -> Result<String, TlsError> {
    if hostname.is_ascii() {
        return Ok(hostname.to_string());
    }

    match url::Host::parse(hostname) {
        Ok(url::Host::Domain(domain)) => Ok(domain),
        Ok(_) | Err(_) => Err(TlsError::InvalidConfig(format!(
            "Invalid hostname: {:?}",
            hostname
        ))),
    }
}
