//! Error and rejection types for the trust layer.
//!
//! [`AuthError`] is returned by operations that can fail for reasons the
//! caller must surface: missing configuration or out-of-range input.
//! Session and webhook verification never return errors to the caller; their
//! [`SessionRejection`] and [`WebhookRejection`] reasons only feed the logs.

use edgehub_core::ConfigError;

/// Errors surfaced by presigning and outbound webhook signing.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A storage setting or a signing secret is not configured.
    #[error("not configured: {0}")]
    Configuration(#[from] ConfigError),

    /// The requested URL lifetime is outside `1..=604800` seconds.
    #[error("invalid expiry: {0} seconds")]
    InvalidExpiry(u64),

    /// The object key is empty.
    #[error("object key must not be empty")]
    EmptyObjectKey,
}

impl AuthError {
    /// Whether this error stems from process configuration rather than the
    /// request. Callers map these to 5xx responses.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Why a session token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionRejection {
    /// No token was presented.
    #[error("no session token")]
    Missing,

    /// The token is not three non-empty base64url segments of valid JSON.
    #[error("malformed session token")]
    Malformed,

    /// The HMAC over `header.payload` does not match the signature segment.
    #[error("session signature mismatch")]
    SignatureMismatch,

    /// The signed header names an algorithm other than HS256.
    #[error("unsupported session algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token's expiry is in the past.
    #[error("session expired at {expires_at} (now {now})")]
    Expired {
        /// Expiry carried by the token.
        expires_at: i64,
        /// The instant used for the check.
        now: i64,
    },
}

impl SessionRejection {
    /// Short machine-readable reason for logs.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::SignatureMismatch => "signature_mismatch",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::Expired { .. } => "expired",
        }
    }
}

/// Why an inbound webhook delivery was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookRejection {
    /// The shared secret is empty; anyone could produce a matching HMAC.
    #[error("webhook secret is empty")]
    MissingSecret,

    /// The signature header lacks `t` or `v1`, or `t` is not an integer.
    #[error("malformed signature header")]
    MalformedHeader,

    /// No `v1` entry matches the HMAC of `<t>.<body>`.
    #[error("webhook signature mismatch")]
    SignatureMismatch,

    /// The signature is authentic but its timestamp is outside the tolerance.
    #[error("webhook timestamp {timestamp} is {skew}s from now (tolerance {tolerance}s)")]
    ClockSkew {
        /// Timestamp carried by the header.
        timestamp: i64,
        /// Absolute distance from now, in seconds.
        skew: u64,
        /// Accepted distance, in seconds.
        tolerance: u64,
    },
}

impl WebhookRejection {
    /// Short machine-readable reason for logs.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingSecret => "missing_secret",
            Self::MalformedHeader => "malformed",
            Self::SignatureMismatch => "signature_mismatch",
            Self::ClockSkew { .. } => "clock_skew",
        }
    }
}
