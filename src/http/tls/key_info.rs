//! Ephemeral key inspection
//!
//! OpenSSL keeps the peer's temporary (key exchange) key on the connection
//! but the `openssl` crate does not expose it on every version it supports,
//! so it is fetched through the raw handle.

use foreign_types::{ForeignType, ForeignTypeRef};
use libc::{c_int, c_long, c_void};
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef, Public};
use openssl::ssl::SslRef;
use std::ptr;

/// `SSL_CTRL_GET_PEER_TMP_KEY` (named `SSL_CTRL_GET_SERVER_TMP_KEY` before 3.0)
const SSL_CTRL_GET_PEER_TMP_KEY: c_int = 109;

/// Describe the temporary key negotiated with the peer
///
/// Returns `None` if the engine has no temporary key for this connection,
/// e.g. before the handshake or with static RSA key exchange.
pub fn temp_key_info(ssl: &SslRef) -> Option<String> {
    let mut raw: *mut openssl_sys::EVP_PKEY = ptr::null_mut();

    // SAFETY: the ctrl writes a new reference to the key (or nothing) into
    // `raw`; ownership of that reference passes to us.
    let ok = unsafe {
        openssl_sys::SSL_ctrl(
            ssl.as_ptr(),
            SSL_CTRL_GET_PEER_TMP_KEY,
            0 as c_long,
            &mut raw as *mut *mut openssl_sys::EVP_PKEY as *mut c_void,
        )
    };

    if ok == 0 || raw.is_null() {
        return None;
    }

    // SAFETY: non-null and owned, freed when `key` drops
    let key: PKey<Public> = unsafe { PKey::from_ptr(raw) };
    Some(describe_key(&key))
}

/// Format key type, curve and size as `ECDH, prime256v1, 256 bits`
pub fn describe_key<T: HasPublic>(key: &PKeyRef<T>) -> String {
    let mut parts = Vec::new();

    match key.id() {
        Id::RSA => parts.push("RSA".to_string()),
        Id::DH => parts.push("DH".to_string()),
        Id::EC => {
            parts.push("ECDH".to_string());
            let curve = key
                .ec_key()
                .ok()
                .and_then(|ec| ec.group().curve_name())
                .and_then(|nid| nid.short_name().ok());
            if let Some(curve) = curve {
                parts.push(curve.to_string());
            }
        }
        other => {
            let name = Nid::from_raw(other.as_raw())
                .short_name()
                .unwrap_or("UNKNOWN");
            parts.push(name.to_string());
        }
    }

    parts.push(format!("{} bits", key.bits()));
    parts.join(", ")
}
