//! TLS client session
//!
//! This module drives the client handshake and runs the verification
//! policy at its two checkpoints. Once established, the session is a plain
//! `Read + Write` byte stream.

use super::cert::CertInfo;
use super::config::TlsError;
use super::connection::HandshakeConnection;
use super::policy::HandshakePolicy;
use openssl::ssl::{Ssl, SslContext, SslStream};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// Established client TLS session
pub struct TlsSession {
    stream: SslStream<TcpStream>,
    failed: bool,
}

impl TlsSession {
    /// Perform a client handshake over `tcp_stream`
    ///
    /// `policy` sees the connection right before the ClientHello and right
    /// after the handshake completes. If it rejects the connection, the
    /// session is shut down and the policy's error is returned.
    pub fn connect<P>(tcp_stream: TcpStream, ctx: &SslContext, policy: &P) -> Result<Self, TlsError>
    where
        P: HandshakePolicy + ?Sized,
    {
        let mut ssl = Ssl::new(ctx)?;

        policy.on_handshake_start(&mut *ssl)?;

        // The openssl crate's connect() runs the whole handshake synchronously
        let stream = ssl
            .connect(tcp_stream)
            .map_err(|e| TlsError::HandshakeFailed(format!("Connection failed: {}", e)))?;

        let mut session = TlsSession {
            stream,
            failed: false,
        };

        if let Err(e) = policy.on_handshake_done(session.stream.ssl()) {
            let _ = session.close();
            return Err(e);
        }

        Ok(session)
    }

    /// Get the negotiated protocol version name
    pub fn version(&self) -> &'static str {
        self.stream.ssl().version_str()
    }

    /// Get the negotiated cipher name
    pub fn cipher(&self) -> Option<&'static str> {
        self.stream.ssl().current_cipher().map(|c| c.name())
    }

    /// Get the negotiated ALPN protocol
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        self.stream.ssl().selected_alpn_protocol()
    }

    /// Get the peer certificate's identity information
    pub fn peer_cert_info(&self) -> Result<Option<CertInfo>, TlsError> {
        Ok(self.stream.ssl().peer_cert_info()?)
    }

    /// Describe the ephemeral key used for key exchange
    pub fn temp_key_info(&self) -> Option<String> {
        self.stream.ssl().temp_key_info()
    }

    /// Check if an I/O operation on the session failed
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Get reference to underlying TCP stream
    pub fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }

    /// Send close_notify (unless the session failed) and shut the socket down
    pub fn close(&mut self) -> Result<(), TlsError> {
        if !self.failed {
            let _ = self.stream.shutdown();
        }

        self.stream.get_mut().shutdown(Shutdown::Both)?;
        Ok(())
    }
}

impl Read for TlsSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).map_err(|e| {
            self.failed = true;
            e
        })
    }
}

impl Write for TlsSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf).map_err(|e| {
            self.failed = true;
            e
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().map_err(|e| {
            self.failed = true;
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tls::config::{TlsConfig, TrustPolicy};
    use crate::http::tls::hostname::VerifyErrorKind;
    use crate::test_support::{spawn_echo_server, ServerIdentity};

    #[test]
    fn test_tls_client_handshake_and_echo() {
        let (addr, server) = spawn_echo_server(ServerIdentity::new("server.test", &["localhost"]), None);
        let config = TlsConfig::client().build().unwrap();

        let tcp_stream = TcpStream::connect(addr).unwrap();
        let mut session = config.connect("localhost", tcp_stream).unwrap();

        assert!(!session.failed());
        assert!(session.version().starts_with("TLS"));
        assert!(session.cipher().is_some());
        assert!(session.temp_key_info().is_some());

        session.write_all(b"Hello").unwrap();
        let mut buf = [0u8; 5];
        session.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"Hello");

        let cert = session.peer_cert_info().unwrap().unwrap();
        assert!(cert.subject.ends_with("/CN=server.test"));

        session.close().unwrap();
        assert_eq!(server.join().unwrap().as_deref(), Some("localhost"));
    }

    #[test]
    fn test_strict_mismatch_aborts() {
        let (addr, server) = spawn_echo_server(ServerIdentity::new("server.test", &["other.test"]), None);
        let config = TlsConfig::client()
            .trust_policy(TrustPolicy::Strict)
            .build()
            .unwrap();

        let tcp_stream = TcpStream::connect(addr).unwrap();
        let err = match config.connect("localhost", tcp_stream) {
            Ok(_) => panic!("strict policy accepted a mismatched certificate"),
            Err(err) => err,
        };

        match err {
            TlsError::Verification(e) => assert_eq!(e.kind(), VerifyErrorKind::Verification),
            other => panic!("unexpected error: {}", other),
        }

        server.join().unwrap();
    }
}
