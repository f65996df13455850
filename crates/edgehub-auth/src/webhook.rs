//! Webhook signatures.
//!
//! Inbound deliveries carry a `t=<unix>,v1=<hex>` header where `v1` is
//! `HMAC-SHA256(secret, "<t>.<raw body>")`. Outbound deliveries are signed
//! with a plain `HMAC-SHA256(secret, payload)` unless the receiver expects the
//! timestamped header.
//!
//! Bodies are always the exact bytes from the wire. Parsing and re-encoding a
//! JSON body before verification breaks the signature.

use std::fmt;
use std::sync::Arc;

use edgehub_core::{Clock, ConfigError, Secret};
use tracing::{debug, warn};

use crate::crypto::{DIGEST_LEN, constant_time_eq, hmac_sha256, hmac_sha256_parts, to_hex};
use crate::error::{AuthError, WebhookRejection};

/// Accepted distance between a delivery timestamp and now, in seconds.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Parsed `t=...,v1=...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Delivery timestamp in unix seconds.
    pub timestamp: i64,
    /// Every `v1` entry, in header order. More than one appears while the
    /// sender rotates secrets.
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    /// Parse a signature header.
    ///
    /// Pairs are split on commas; unknown keys are ignored and the first `t`
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookRejection::MalformedHeader`] when `t` or `v1` is
    /// missing or `t` is not an integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgehub_auth::webhook::SignatureHeader;
    ///
    /// let header = SignatureHeader::parse("t=1700000000,v0=legacy,v1=ab,v1=cd").unwrap();
    /// assert_eq!(header.timestamp, 1_700_000_000);
    /// assert_eq!(header.signatures, ["ab", "cd"]);
    /// ```
    pub fn parse(header: &str) -> Result<Self, WebhookRejection> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for (key, value) in header
            .split(',')
            .filter_map(|pair| pair.trim().split_once('='))
        {
            match key {
                "t" if timestamp.is_none() => timestamp = Some(value),
                "v1" => signatures.push(value.to_owned()),
                _ => {}
            }
        }

        let timestamp = timestamp
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or(WebhookRejection::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(WebhookRejection::MalformedHeader);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// HMAC of `"<timestamp>.<payload>"`.
fn timestamped_mac(timestamp: i64, payload: &[u8], secret: &Secret) -> [u8; DIGEST_LEN] {
    hmac_sha256_parts(
        secret.expose(),
        &[timestamp.to_string().as_bytes(), b".", payload],
    )
}

/// An empty key makes the HMAC computable by anyone.
fn require_secret(secret: &Secret) -> Result<(), AuthError> {
    if secret.is_empty() {
        return Err(ConfigError::MissingSecret("webhook secret").into());
    }
    Ok(())
}

/// Sign an outbound payload: `hex(HMAC-SHA256(secret, payload))`.
///
/// # Errors
///
/// Returns [`AuthError::Configuration`] for an empty secret.
///
/// # Examples
///
/// ```
/// use edgehub_auth::webhook::sign_outbound;
/// use edgehub_core::Secret;
///
/// let signature = sign_outbound(b"{}", &Secret::new("whsec")).unwrap();
/// assert_eq!(signature.len(), 64);
/// assert!(sign_outbound(b"{}", &Secret::new("")).is_err());
/// ```
pub fn sign_outbound(payload: &[u8], secret: &Secret) -> Result<String, AuthError> {
    require_secret(secret)?;
    Ok(to_hex(&hmac_sha256(secret.expose(), payload)))
}

/// Build a `t=<timestamp>,v1=<hex>` header for `payload`.
///
/// # Errors
///
/// Returns [`AuthError::Configuration`] for an empty secret.
pub fn signature_header(
    timestamp: i64,
    payload: &[u8],
    secret: &Secret,
) -> Result<String, AuthError> {
    require_secret(secret)?;
    Ok(format!(
        "t={timestamp},v1={}",
        to_hex(&timestamped_mac(timestamp, payload, secret))
    ))
}

/// Verifies inbound deliveries and signs outbound ones against a clock.
#[derive(Clone)]
pub struct WebhookCodec {
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for WebhookCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookCodec")
            .field("clock", &self.clock)
            .finish()
    }
}

impl WebhookCodec {
    /// Create a codec reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Whether `raw_body` was signed by a holder of `secret` within
    /// `tolerance_secs` of now.
    #[must_use]
    pub fn verify_inbound(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        secret: &Secret,
        tolerance_secs: u64,
    ) -> bool {
        match self.check_inbound(raw_body, signature_header, secret, tolerance_secs) {
            Ok(_) => true,
            Err(
                rejection @ (WebhookRejection::ClockSkew { .. } | WebhookRejection::MissingSecret),
            ) => {
                warn!(reason = rejection.reason(), %rejection, "webhook rejected");
                false
            }
            Err(rejection) => {
                debug!(reason = rejection.reason(), "webhook rejected");
                false
            }
        }
    }

    /// Verify an inbound delivery, reporting why it was rejected.
    ///
    /// An empty secret rejects every delivery. The signature is checked
    /// before the timestamp, so a stale but authentic delivery is reported as
    /// [`WebhookRejection::ClockSkew`]. On success returns the delivery
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns the [`WebhookRejection`] that applies.
    pub fn check_inbound(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        secret: &Secret,
        tolerance_secs: u64,
    ) -> Result<i64, WebhookRejection> {
        if secret.is_empty() {
            return Err(WebhookRejection::MissingSecret);
        }
        let now = self.clock.unix_seconds();
        let header = SignatureHeader::parse(signature_header)?;
        let expected = timestamped_mac(header.timestamp, raw_body, secret);

        // Every candidate is compared; a match does not short-circuit.
        let matched = header.signatures.iter().fold(false, |matched, candidate| {
            let candidate = hex::decode(candidate).unwrap_or_default();
            constant_time_eq(&expected, &candidate) | matched
        });
        if !matched {
            return Err(WebhookRejection::SignatureMismatch);
        }

        let skew = now.abs_diff(header.timestamp);
        if skew > tolerance_secs {
            return Err(WebhookRejection::ClockSkew {
                timestamp: header.timestamp,
                skew,
                tolerance: tolerance_secs,
            });
        }

        Ok(header.timestamp)
    }

    /// Sign an outbound payload without a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] for an empty secret.
    pub fn sign_outbound(&self, payload: &[u8], secret: &Secret) -> Result<String, AuthError> {
        sign_outbound(payload, secret)
    }

    /// Sign an outbound payload as a `t=<now>,v1=<hex>` header.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] for an empty secret.
    pub fn sign_outbound_timestamped(
        &self,
        payload: &[u8],
        secret: &Secret,
    ) -> Result<String, AuthError> {
        signature_header(self.clock.unix_seconds(), payload, secret)
    }
}

#[cfg(test)]
mod tests {
    use edgehub_core::FixedClock;
    use proptest::prelude::*;

    use super::*;

    const BODY: &[u8] = br#"{"id":"evt_1","type":"invoice.paid"}"#;
    const T: i64 = 1_700_000_000;
    const V1: &str = "46dc069361a7691082640523fa33fe5d6c8c88d5f5e257cdf8cf11539d166595";

    fn secret() -> Secret {
        Secret::new("whsec_test_secret")
    }

    fn codec_at(now: i64) -> WebhookCodec {
        WebhookCodec::new(Arc::new(FixedClock::from_unix(now)))
    }

    #[test]
    fn test_should_build_known_signature_header() {
        assert_eq!(
            signature_header(T, BODY, &secret()).unwrap(),
            format!("t={T},v1={V1}")
        );
    }

    #[test]
    fn test_should_accept_fresh_signed_delivery() {
        let header = format!("t={T},v1={V1}");
        assert!(codec_at(T).verify_inbound(BODY, &header, &secret(), 300));
        assert_eq!(
            codec_at(T + 300).check_inbound(BODY, &header, &secret(), 300),
            Ok(T)
        );
    }

    #[test]
    fn test_should_reject_mutated_body() {
        let header = format!("t={T},v1={V1}");
        let mut body = BODY.to_vec();
        body[2] ^= 0x01;
        assert_eq!(
            codec_at(T).check_inbound(&body, &header, &secret(), 300),
            Err(WebhookRejection::SignatureMismatch)
        );
    }

    #[test]
    fn test_should_reject_other_secret() {
        let header = format!("t={T},v1={V1}");
        assert!(!codec_at(T).verify_inbound(BODY, &header, &Secret::new("whsec_other"), 300));
    }

    #[test]
    fn test_should_reject_stale_and_future_timestamps() {
        let header = format!("t={T},v1={V1}");
        assert_eq!(
            codec_at(T + 301).check_inbound(BODY, &header, &secret(), 300),
            Err(WebhookRejection::ClockSkew {
                timestamp: T,
                skew: 301,
                tolerance: 300
            })
        );
        assert!(!codec_at(T - 301).verify_inbound(BODY, &header, &secret(), 300));
    }

    #[test]
    fn test_should_reject_malformed_headers() {
        let codec = codec_at(T);
        let headers = [
            String::new(),
            "garbage".to_owned(),
            format!("v1={V1}"),
            format!("t=,v1={V1}"),
            format!("t=soon,v1={V1}"),
            "t=1700000000".to_owned(),
            "t=1700000000,v0=abc".to_owned(),
        ];
        for header in &headers {
            assert_eq!(
                codec.check_inbound(BODY, header, &secret(), 300),
                Err(WebhookRejection::MalformedHeader),
                "{header}"
            );
        }
    }

    #[test]
    fn test_should_accept_any_rotated_signature() {
        let header = format!("t={T},v1=deadbeef,v1={V1},v1=not-hex");
        assert!(codec_at(T).verify_inbound(BODY, &header, &secret(), 300));
    }

    #[test]
    fn test_should_tolerate_whitespace_and_unknown_keys() {
        let header = format!("t={T}, v0=legacy , v1={}", V1.to_uppercase());
        assert!(codec_at(T).verify_inbound(BODY, &header, &secret(), 300));
    }

    #[test]
    fn test_should_verify_non_utf8_bodies() {
        let body = [0xff, 0x00, 0xfe];
        let header = signature_header(T, &body, &secret()).unwrap();
        assert!(codec_at(T).verify_inbound(&body, &header, &secret(), 300));
    }

    #[test]
    fn test_should_sign_outbound_known_vector() {
        assert_eq!(
            sign_outbound(BODY, &secret()).unwrap(),
            "2e69958eb5a4f9ec4965663bcad831d2aa9068109d63e8525c7a80fafb46a80d"
        );
    }

    #[test]
    fn test_should_round_trip_timestamped_outbound() {
        let codec = codec_at(T);
        let header = codec.sign_outbound_timestamped(BODY, &secret()).unwrap();
        assert_eq!(header, format!("t={T},v1={V1}"));
        assert!(codec.verify_inbound(BODY, &header, &secret(), DEFAULT_TOLERANCE_SECS));
    }

    #[test]
    fn test_should_reject_delivery_under_empty_secret() {
        let empty = Secret::new("");
        let now = T.to_string();
        let forged = to_hex(&hmac_sha256_parts(b"", &[now.as_bytes(), b".", BODY]));
        let header = format!("t={T},v1={forged}");

        let codec = codec_at(T);
        assert_eq!(
            codec.check_inbound(BODY, &header, &empty, 300),
            Err(WebhookRejection::MissingSecret)
        );
        assert!(!codec.verify_inbound(BODY, &header, &empty, 300));
    }

    #[test]
    fn test_should_refuse_to_sign_with_empty_secret() {
        let empty = Secret::new("");
        let codec = codec_at(T);

        assert!(sign_outbound(BODY, &empty).unwrap_err().is_configuration());
        assert!(signature_header(T, BODY, &empty).is_err());
        assert!(codec.sign_outbound(BODY, &empty).is_err());
        assert!(codec.sign_outbound_timestamped(BODY, &empty).is_err());
    }

    proptest! {
        #[test]
        fn test_should_sign_outbound_as_64_hex_chars(payload in proptest::collection::vec(any::<u8>(), 1..512)) {
            let signature = sign_outbound(&payload, &secret()).unwrap();
            prop_assert_eq!(signature.len(), 64);
            prop_assert!(
                signature
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
            );
        }
    }
}
