//! Hashing, MAC, and encoding primitives shared by every trust component.
//!
//! Session tokens, SigV4 presigning, and webhook signatures all reduce to the
//! handful of functions here. Comparisons of authentication tags must go
//! through [`constant_time_eq`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of a SHA-256 digest and of an HMAC-SHA256 tag.
pub const DIGEST_LEN: usize = 32;

/// Compute the SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Compute the SHA-256 digest of `data` as lowercase hex.
///
/// # Examples
///
/// ```
/// use edgehub_auth::crypto::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Compute HMAC-SHA256 of `data` under `key`.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; DIGEST_LEN] {
    hmac_sha256_parts(key, &[data])
}

/// Compute HMAC-SHA256 over the concatenation of `parts` without copying them
/// into one buffer.
#[must_use]
pub fn hmac_sha256_parts(key: &[u8], parts: &[&[u8]]) -> [u8; DIGEST_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Compute HMAC-SHA256 of `data` under `key` as lowercase hex.
#[must_use]
pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Encode bytes as lowercase hex.
#[must_use]
pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Encode bytes as unpadded base64url.
///
/// # Examples
///
/// ```
/// use edgehub_auth::crypto::base64url_encode;
///
/// assert_eq!(base64url_encode(&[0xfb, 0xff]), "-_8");
/// ```
#[must_use]
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode unpadded base64url.
///
/// Returns `None` for padding, characters outside the URL-safe alphabet, or
/// non-canonical trailing bits.
#[must_use]
pub fn base64url_decode(input: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(input).ok()
}

/// Compare two byte strings without branching on their contents.
///
/// Slices of different length compare unequal immediately; the length of an
/// authentication tag is public. Equal-length slices are always scanned in
/// full.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_hash_empty_payload() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_should_compute_rfc4231_hmac_vector() {
        // RFC 4231 test case 2.
        assert_eq!(
            hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_should_match_single_buffer_when_split_into_parts() {
        let whole = hmac_sha256(b"key", b"1700000000.{\"a\":1}");
        let parts = hmac_sha256_parts(b"key", &[b"1700000000", b".", b"{\"a\":1}"]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn test_should_encode_base64url_without_padding() {
        assert_eq!(base64url_encode(b"a"), "YQ");
        assert_eq!(base64url_encode(b"ab"), "YWI");
        assert_eq!(base64url_decode("YWI").unwrap(), b"ab");
    }

    #[test]
    fn test_should_reject_padded_or_standard_base64() {
        assert!(base64url_decode("YWI=").is_none());
        assert!(base64url_decode("+/8").is_none());
        assert!(base64url_decode("a.b").is_none());
    }

    #[test]
    fn test_should_compare_in_constant_time() {
        assert!(constant_time_eq(b"hello world", b"hello world"));
        assert!(!constant_time_eq(b"hello world", b"hello worle"));
        assert!(!constant_time_eq(b"hello", b"hello world"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_should_encode_hex_lowercase() {
        assert_eq!(to_hex(&[0xAB, 0x01]), "ab01");
    }
}
