//! Hostname verification against a peer certificate
//!
//! Matches a DNS-ID (the hostname we meant to reach) against the dNSName
//! entries of the certificate's subjectAltName extension. The subject CN is
//! never consulted.
//!
//! Errors fall into three kinds, see [`VerifyErrorKind`]. Callers that relax
//! trust rely on telling them apart.

use super::cert::{AltName, CertInfo};
use std::net::IpAddr;

/// Broad classification of a verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyErrorKind {
    /// The certificate cannot identify anyone (missing, no SANs, bad pattern)
    Certificate,
    /// The certificate is well formed but names someone else
    Verification,
    /// The hostname itself is not a valid DNS-ID
    Value,
}

/// Hostname verification errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("Peer did not present a certificate")]
    NoPeerCertificate,

    #[error("Certificate does not contain any `subjectAltName`s.")]
    NoSubjectAltNames,

    #[error("Certificate's DNS-ID {pattern:?} {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("DNS-ID {hostname:?} does not match any of {presented:?}")]
    Mismatch { hostname: String, presented: Vec<String> },

    #[error("Invalid DNS-ID {0:?}")]
    InvalidDnsId(String),
}

impl VerifyError {
    /// Classify the error
    pub fn kind(&self) -> VerifyErrorKind {
        match self {
            VerifyError::NoPeerCertificate
            | VerifyError::NoSubjectAltNames
            | VerifyError::InvalidPattern { .. } => VerifyErrorKind::Certificate,
            VerifyError::Mismatch { .. } => VerifyErrorKind::Verification,
            VerifyError::InvalidDnsId(_) => VerifyErrorKind::Value,
        }
    }
}

/// Verify that `cert` is valid for `hostname`
///
/// 1. The hostname must be a valid DNS-ID (not an IP, only `[a-z0-9-_.]`
///    after IDNA encoding and lowercasing).
/// 2. The certificate must carry at least one subjectAltName, and every
///    dNSName pattern must be well formed.
/// 3. One of the patterns must match.
pub fn verify_hostname(cert: Option<&CertInfo>, hostname: &str) -> Result<(), VerifyError> {
    verify_alt_names(cert.map(|c| c.subject_alt_names.as_slice()), hostname)
}

/// Verify `hostname` against a certificate's subject alternative names
///
/// `None` stands for a peer that presented no certificate. Same rules as
/// [`verify_hostname`].
pub fn verify_alt_names(alt_names: Option<&[AltName]>, hostname: &str) -> Result<(), VerifyError> {
    let dns_id = dns_id(hostname)?;

    let alt_names = alt_names.ok_or(VerifyError::NoPeerCertificate)?;
    if alt_names.is_empty() {
        return Err(VerifyError::NoSubjectAltNames);
    }

    let patterns = alt_names
        .iter()
        .filter_map(|name| match name {
            AltName::Dns(dns) => Some(dns_pattern(dns)),
            _ => None,
        })
        .collect::<Result<Vec<_>, _>>()?;

    if patterns.iter().any(|p| matches_dns(p, &dns_id)) {
        return Ok(());
    }

    Err(VerifyError::Mismatch {
        hostname: dns_id,
        presented: patterns,
    })
}

/// Normalize a hostname into a DNS-ID
fn dns_id(hostname: &str) -> Result<String, VerifyError> {
    let invalid = || VerifyError::InvalidDnsId(hostname.to_string());

    let trimmed = hostname.trim();
    if trimmed.is_empty() || is_ip_address(trimmed) {
        return Err(invalid());
    }

    let ascii = if trimmed.is_ascii() {
        trimmed.to_ascii_lowercase()
    } else {
        url::Host::parse(trimmed)
            .ok()
            .and_then(|host| match host {
                url::Host::Domain(domain) => Some(domain),
                _ => None,
            })
            .ok_or_else(invalid)?
    };

    if !ascii.bytes().all(is_legal_dns_byte) {
        return Err(invalid());
    }

    Ok(ascii)
}

/// Validate and normalize a dNSName pattern from the certificate
fn dns_pattern(raw: &str) -> Result<String, VerifyError> {
    let invalid = |reason| VerifyError::InvalidPattern {
        pattern: raw.to_string(),
        reason,
    };

    let pattern = raw.trim();
    if pattern.is_empty() || pattern.contains('\0') || is_ip_address(pattern) {
        return Err(invalid("is not a valid DNS pattern"));
    }

    let pattern = pattern.to_ascii_lowercase();
    let wildcards = pattern.matches('*').count();
    if wildcards > 1 {
        return Err(invalid("has too many wildcards"));
    }
    if wildcards == 1 {
        let labels: Vec<&str> = pattern.split('.').collect();
        if labels.len() < 3 {
            return Err(invalid("has too few host components for wildcard usage"));
        }
        if !labels[0].contains('*') {
            return Err(invalid("has a wildcard outside the left-most part"));
        }
    }

    Ok(pattern)
}

/// Match a normalized pattern against a normalized DNS-ID
///
/// A wildcard only stands in for a whole leftmost label, and never for an
/// IDNA label.
fn matches_dns(pattern: &str, dns_id: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == dns_id;
    }

    let (Some((pattern_head, pattern_tail)), Some((host_head, host_tail))) =
        (pattern.split_once('.'), dns_id.split_once('.'))
    else {
        return false;
    };

    if pattern_tail != host_tail || host_head.starts_with("xn--") {
        return false;
    }

    pattern_head == "*" || pattern_head == host_head
}

fn is_legal_dns_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b'.')
}

fn is_ip_address(s: &str) -> bool {
    s.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}
