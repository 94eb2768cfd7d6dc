//! Shared test helpers
//!
//! Used by the integration tests and, through `crate::test_support`, by the
//! unit tests.

#![allow(dead_code)]

use log::{Level, LevelFilter, Log, Metadata, Record};
use openssl::asn1::{Asn1Time, Asn1Type};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{AlpnError, NameType, SslAcceptor, SslMethod};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::Once;
use std::thread::{self, JoinHandle};

/// A log record captured on the current thread
#[derive(Debug, Clone)]
pub struct Captured {
    pub level: Level,
    pub target: String,
    pub message: String,
}

thread_local! {
    static RECORDS: RefCell<Vec<Captured>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records.borrow_mut().push(Captured {
                level: record.level(),
                target: record.target().to_string(),
                message: record.args().to_string(),
            })
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Run `f` and return its result with the crate's records it logged on
/// this thread
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<Captured>) {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });

    RECORDS.with(|records| records.borrow_mut().clear());
    let result = f();
    let records: Vec<Captured> = RECORDS.with(|records| {
        records
            .borrow_mut()
            .drain(..)
            .filter(|r| r.target.starts_with("crawlnet"))
            .collect()
    });
    (result, records)
}

pub fn at_level(records: &[Captured], level: Level) -> Vec<&Captured> {
    records.iter().filter(|r| r.level == level).collect()
}

/// Certificate contents for a test server
pub struct ServerIdentity {
    pub common_name: &'static str,
    pub dns_names: &'static [&'static str],
    /// Encode the organization as `SEQUENCE { UTF8String "A" }`, a value
    /// OpenSSL accepts but cannot convert to text
    pub nested_organization: bool,
}

impl ServerIdentity {
    /// Identity with a plain subject
    pub const fn new(common_name: &'static str, dns_names: &'static [&'static str]) -> Self {
        ServerIdentity {
            common_name,
            dns_names,
            nested_organization: false,
        }
    }
}

/// Generate a self-signed P-256 certificate
pub fn self_signed(identity: &ServerIdentity) -> (X509, PKey<Private>) {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("C", "NO").unwrap();
    if identity.nested_organization {
        name.append_entry_by_nid_with_type(Nid::ORGANIZATIONNAME, "\x30\x03\x0c\x01A", Asn1Type::SEQUENCE)
            .unwrap();
    } else {
        name.append_entry_by_text("O", "Crawlnet Test").unwrap();
    }
    name.append_entry_by_text("CN", identity.common_name).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(7).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();

    if !identity.dns_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in identity.dns_names {
            san.dns(dns);
        }
        let san = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(san).unwrap();
    }

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

/// Spawn a one-shot TLS echo server
///
/// The server echoes one 5-byte message, then waits for the client to close.
/// A client that aborts after the handshake is tolerated. Joining the handle
/// yields the SNI hostname the client sent.
pub fn spawn_echo_server(
    identity: ServerIdentity,
    alpn: Option<&'static str>,
) -> (SocketAddr, JoinHandle<Option<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let (cert, key) = self_signed(&identity);
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.set_private_key(&key).unwrap();
    if let Some(proto) = alpn {
        acceptor.set_alpn_select_callback(move |_ssl, client_protos| {
            let mut pos = 0;
            while pos < client_protos.len() {
                let len = client_protos[pos] as usize;
                let candidate = client_protos.get(pos + 1..pos + 1 + len).ok_or(AlpnError::NOACK)?;
                if candidate == proto.as_bytes() {
                    return Ok(candidate);
                }
                pos += 1 + len;
            }
            Err(AlpnError::NOACK)
        });
    }
    let acceptor = acceptor.build();

    let handle = thread::spawn(move || {
        let (tcp_stream, _) = listener.accept().unwrap();
        let mut stream = match acceptor.accept(tcp_stream) {
            Ok(stream) => stream,
            Err(_) => return None,
        };
        let server_name = stream.ssl().servername(NameType::HOST_NAME).map(str::to_string);

        let mut buf = [0u8; 5];
        if stream.read_exact(&mut buf).is_ok() {
            let _ = stream.write_all(&buf);
        }

        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
        let _ = stream.shutdown();
        server_name
    });

    (addr, handle)
}
