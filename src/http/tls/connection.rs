//! Connection handle seen by handshake policies
//!
//! Policies never touch OpenSSL directly. They go through
//! `HandshakeConnection`, which keeps them testable against a fake
//! connection.

use super::cert::{self, AltName, CertInfo};
use super::config::TlsError;
use super::key_info;
use openssl::error::ErrorStack;
use openssl::ssl::SslRef;

/// Operations a handshake policy may perform on a live connection
pub trait HandshakeConnection {
    /// Set the SNI server name sent in the ClientHello
    fn set_server_name(&mut self, name: &[u8]) -> Result<(), TlsError>;

    /// Get the negotiated protocol version name (e.g. "TLSv1.3")
    fn protocol_version_name(&self) -> String;

    /// Get the negotiated cipher name, if a cipher has been chosen
    fn cipher_name(&self) -> Option<String>;

    /// Get the peer certificate's identity information
    fn peer_cert_info(&self) -> Result<Option<CertInfo>, ErrorStack>;

    /// Get only the peer certificate's subject alternative names
    ///
    /// `None` if the peer presented no certificate.
    fn peer_alt_names(&self) -> Result<Option<Vec<AltName>>, ErrorStack>;

    /// Describe the temporary key used for key exchange, if any
    fn temp_key_info(&self) -> Option<String>;
}

impl HandshakeConnection for SslRef {
    fn set_server_name(&mut self, name: &[u8]) -> Result<(), TlsError> {
        let name = std::str::from_utf8(name).map_err(|_| {
            TlsError::InvalidConfig(format!("SNI name is not valid UTF-8: {:?}", name))
        })?;
        self.set_hostname(name)?;
        Ok(())
    }

    fn protocol_version_name(&self) -> String {
        self.version_str().to_string()
    }

    fn cipher_name(&self) -> Option<String> {
        self.current_cipher().map(|c| c.name().to_string())
    }

    fn peer_cert_info(&self) -> Result<Option<CertInfo>, ErrorStack> {
        Ok(self.peer_certificate().map(|cert| CertInfo::from_x509(&cert)))
    }

    fn peer_alt_names(&self) -> Result<Option<Vec<AltName>>, ErrorStack> {
        Ok(self.peer_certificate().map(|x509| cert::subject_alt_names(&x509)))
    }

    fn temp_key_info(&self) -> Option<String> {
        key_info::temp_key_info(self)
    }
}
