//! Stateless session tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(HMAC-SHA256)`,
//! with the fixed header `{"alg":"HS256","typ":"JWT"}`. Nothing is stored
//! server side: verification is a pure function of the token, the secret,
//! and the clock. Rotating the secret revokes every outstanding token.

use std::fmt;
use std::sync::Arc;

use edgehub_core::{Clock, ConfigError, ConfigResult, Secret};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{base64url_decode, base64url_encode, constant_time_eq, hmac_sha256};
use crate::error::SessionRejection;

/// Algorithm named in every token header.
pub const SESSION_ALGORITHM: &str = "HS256";

/// Lifetime given to tokens whose claims carry no expiry (30 days).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 2_592_000;

/// Access level carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The account owner.
    Owner,
    /// An administrator.
    Admin,
    /// A regular user.
    User,
}

impl Role {
    /// Lowercase role name as it appears in tokens.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session token asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Who the session belongs to.
    #[serde(rename = "sub")]
    pub subject: String,
    /// Access level.
    pub role: Role,
    /// Issue instant in unix seconds.
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    /// Expiry in unix seconds.
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl SessionClaims {
    /// Claims with no timestamps; [`SessionAuthenticator::issue`] fills them.
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
            issued_at: None,
            expires_at: None,
        }
    }

    /// Set an explicit expiry.
    #[must_use]
    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

#[derive(Serialize, Deserialize)]
struct TokenHeader<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// Issues and verifies session tokens under one secret.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use edgehub_auth::session::{Role, SessionAuthenticator, SessionClaims};
/// use edgehub_core::{FixedClock, Secret};
///
/// let auth = SessionAuthenticator::new(
///     Secret::new("test-session-secret"),
///     Arc::new(FixedClock::from_unix(1_700_000_000)),
/// )
/// .unwrap();
///
/// let token = auth.issue(SessionClaims::new("owner@local", Role::Owner));
/// let claims = auth.verify(Some(&token)).unwrap();
/// assert_eq!(claims.subject, "owner@local");
/// assert_eq!(claims.expires_at, Some(1_702_592_000));
/// assert!(auth.verify(Some("not.a.token")).is_none());
/// ```
#[derive(Clone)]
pub struct SessionAuthenticator {
    secret: Secret,
    clock: Arc<dyn Clock>,
    default_ttl_secs: u64,
}

impl fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("default_ttl_secs", &self.default_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl SessionAuthenticator {
    /// Create an authenticator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] for an empty secret.
    pub fn new(secret: Secret, clock: Arc<dyn Clock>) -> ConfigResult<Self> {
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret("JWT_SECRET"));
        }
        Ok(Self {
            secret,
            clock,
            default_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        })
    }

    /// Override the lifetime given to claims without an expiry.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl_secs = ttl_secs;
        self
    }

    /// Lifetime given to claims without an expiry.
    #[must_use]
    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Sign `claims`.
    ///
    /// `issued_at` defaults to now and `expires_at` to `issued_at` plus the
    /// default lifetime, so every issued token expires.
    #[must_use]
    pub fn issue(&self, mut claims: SessionClaims) -> String {
        let issued_at = *claims.issued_at.get_or_insert_with(|| self.clock.unix_seconds());
        claims.expires_at.get_or_insert_with(|| {
            issued_at.saturating_add(i64::try_from(self.default_ttl_secs).unwrap_or(i64::MAX))
        });

        let header = TokenHeader {
            alg: SESSION_ALGORITHM,
            typ: "JWT",
        };
        let signing_input = format!(
            "{}.{}",
            base64url_encode(&to_json(&header)),
            base64url_encode(&to_json(&claims))
        );
        let signature = hmac_sha256(self.secret.expose(), signing_input.as_bytes());

        debug!(
            subject = %claims.subject,
            role = %claims.role,
            expires_at = claims.expires_at,
            "issued session token"
        );
        format!("{signing_input}.{}", base64url_encode(&signature))
    }

    /// Verify a token; `None` for any failure.
    ///
    /// Reasons are logged at `debug` and never returned.
    #[must_use]
    pub fn verify(&self, token: Option<&str>) -> Option<SessionClaims> {
        match self.check(token) {
            Ok(claims) => Some(claims),
            Err(rejection) => {
                debug!(reason = rejection.reason(), "session token rejected");
                None
            }
        }
    }

    /// Verify a token, reporting why it was rejected.
    ///
    /// The signature is checked before anything inside the token is parsed.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionRejection`] that applies.
    pub fn check(&self, token: Option<&str>) -> Result<SessionClaims, SessionRejection> {
        let token = token.ok_or(SessionRejection::Missing)?;
        let now = self.clock.unix_seconds();

        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or(SessionRejection::Malformed)?;
        let (header, payload) = signing_input
            .split_once('.')
            .ok_or(SessionRejection::Malformed)?;
        if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.')
        {
            return Err(SessionRejection::Malformed);
        }

        let provided = base64url_decode(signature).ok_or(SessionRejection::Malformed)?;
        let expected = hmac_sha256(self.secret.expose(), signing_input.as_bytes());
        if !constant_time_eq(&expected, &provided) {
            return Err(SessionRejection::SignatureMismatch);
        }

        let header_json = base64url_decode(header).ok_or(SessionRejection::Malformed)?;
        let header: TokenHeader<'_> =
            serde_json::from_slice(&header_json).map_err(|_| SessionRejection::Malformed)?;
        if header.alg != SESSION_ALGORITHM {
            return Err(SessionRejection::UnsupportedAlgorithm(header.alg.to_owned()));
        }

        let payload_json = base64url_decode(payload).ok_or(SessionRejection::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload_json).map_err(|_| SessionRejection::Malformed)?;

        match claims.expires_at {
            Some(expires_at) if expires_at < now => {
                Err(SessionRejection::Expired { expires_at, now })
            }
            _ => Ok(claims),
        }
    }
}

// Serializing a derived struct of strings and integers cannot fail.
fn to_json<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("token parts always serialize")
}
