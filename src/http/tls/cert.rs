//! Certificate handling and parsing
//!
//! This module extracts the identity information the verification policy
//! needs from X.509 certificates: printable issuer/subject names and the
//! subject alternative names.

use openssl::x509::{X509NameRef, X509Ref};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Subject alternative name entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AltName {
    /// dNSName entry (a name or wildcard pattern)
    Dns(String),
    /// iPAddress entry
    Ip(IpAddr),
    /// uniformResourceIdentifier entry
    Uri(String),
    /// rfc822Name entry
    Email(String),
}

impl fmt::Display for AltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AltName::Dns(name) => write!(f, "DNS:{}", name),
            AltName::Ip(ip) => write!(f, "IP:{}", ip),
            AltName::Uri(uri) => write!(f, "URI:{}", uri),
            AltName::Email(email) => write!(f, "email:{}", email),
        }
    }
}

/// Certificate identity information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Subject distinguished name in one-line form
    pub subject: String,
    /// Issuer distinguished name in one-line form
    pub issuer: String,
    /// Subject Alternative Names, in certificate order
    pub subject_alt_names: Vec<AltName>,
}

impl CertInfo {
    /// Extract certificate information from an X.509 certificate
    pub fn from_x509(cert: &X509Ref) -> Self {
        CertInfo {
            subject: x509_name_to_string(cert.subject_name()),
            issuer: x509_name_to_string(cert.issuer_name()),
            subject_alt_names: subject_alt_names(cert),
        }
    }

    /// Iterate over the dNSName entries
    pub fn dns_names(&self) -> impl Iterator<Item = &str> {
        self.subject_alt_names.iter().filter_map(|name| match name {
            AltName::Dns(dns) => Some(dns.as_str()),
            _ => None,
        })
    }
}

/// Format a distinguished name as `/C=NO/O=Example/CN=example.com`
///
/// Attributes without a short name are printed by OID. Bytes outside
/// printable ASCII are escaped as `\xHH`, so any value the engine decoded
/// can be rendered.
pub fn x509_name_to_string(name: &X509NameRef) -> String {
    let mut out = String::new();

    for entry in name.entries() {
        let object = entry.object();
        out.push('/');
        match object.nid().short_name() {
            Ok(sn) => out.push_str(sn),
            Err(_) => out.push_str(&object.to_string()),
        }
        out.push('=');
        for &b in entry.data().as_slice() {
            if (0x20..0x7f).contains(&b) {
                out.push(b as char);
            } else {
                out.push_str(&format!("\\x{:02X}", b));
            }
        }
    }

    out
}

/// Read the subject alternative names of `cert`
pub fn subject_alt_names(cert: &X509Ref) -> Vec<AltName> {
    let mut names = Vec::new();

    if let Some(san_ext) = cert.subject_alt_names() {
        for name in san_ext.iter() {
            if let Some(dns) = name.dnsname() {
                names.push(AltName::Dns(dns.to_string()));
            } else if let Some(ip) = name.ipaddress().and_then(ip_from_bytes) {
                names.push(AltName::Ip(ip));
            } else if let Some(uri) = name.uri() {
                names.push(AltName::Uri(uri.to_string()));
            } else if let Some(email) = name.email() {
                names.push(AltName::Email(email.to_string()));
            }
        }
    }

    names
}

fn ip_from_bytes(raw: &[u8]) -> Option<IpAddr> {
    match raw.len() {
        4 => {
            let octets: [u8; 4] = raw.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = raw.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}
