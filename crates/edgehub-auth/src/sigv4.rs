//! AWS Signature Version 4 signing steps.
//!
//! ```text
//! StringToSign = "AWS4-HMAC-SHA256\n" + amzDate + "\n" + credentialScope + "\n" + hex(SHA256(canonicalRequest))
//! kDate        = HMAC("AWS4" + secretKey, date)
//! kRegion      = HMAC(kDate, region)
//! kService     = HMAC(kRegion, service)
//! kSigning     = HMAC(kService, "aws4_request")
//! signature    = hex(HMAC(kSigning, StringToSign))
//! ```

use chrono::{DateTime, Utc};

use crate::crypto::{DIGEST_LEN, hmac_sha256, hmac_sha256_hex, sha256_hex};

/// The only signing algorithm produced or accepted.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Terminator of every credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Service name for S3-compatible storage.
pub const S3_SERVICE: &str = "s3";

/// `strftime` pattern of `X-Amz-Date`.
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Format an instant as `YYYYMMDDTHHMMSSZ`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use edgehub_auth::sigv4::format_amz_date;
///
/// let t = Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap();
/// assert_eq!(format_amz_date(&t), "20130524T000000Z");
/// ```
#[must_use]
pub fn format_amz_date(instant: &DateTime<Utc>) -> String {
    instant.format(AMZ_DATE_FORMAT).to_string()
}

/// Build `date/region/service/aws4_request`.
#[must_use]
pub fn credential_scope(date: &str, region: &str, service: &str) -> String {
    format!("{date}/{region}/{service}/{SCOPE_TERMINATOR}")
}

/// Build the SigV4 string to sign from an already hashed canonical request.
///
/// # Examples
///
/// ```
/// use edgehub_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    amz_date: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{amz_date}\n{credential_scope}\n{canonical_request_hash}")
}

/// Hash a canonical request for inclusion in the string to sign.
#[must_use]
pub fn hash_canonical_request(canonical_request: &str) -> String {
    sha256_hex(canonical_request.as_bytes())
}

/// Derive the SigV4 signing key with the HMAC-SHA256 chain.
#[must_use]
pub fn derive_signing_key(
    secret_key: &[u8],
    date: &str,
    region: &str,
    service: &str,
) -> [u8; DIGEST_LEN] {
    let mut seed = Vec::with_capacity(4 + secret_key.len());
    seed.extend_from_slice(b"AWS4");
    seed.extend_from_slice(secret_key);

    let date_key = hmac_sha256(&seed, date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Sign `string_to_sign` with a derived signing key; returns lowercase hex.
#[must_use]
pub fn compute_signature(signing_key: &[u8], string_to_sign: &str) -> String {
    hmac_sha256_hex(signing_key, string_to_sign.as_bytes())
}
