//! The trust layer facade.
//!
//! [`TrustLayer`] wires the session authenticator, the request presigner and
//! the webhook codec to one configuration and one clock. The HTTP layer talks
//! only to this type.

use std::collections::BTreeMap;
use std::sync::Arc;

use edgehub_core::{
    Clock, ConfigError, ConfigResult, Secret, StorageProvider, SystemClock, TrustConfig,
};
use tracing::{info, warn};

use crate::error::AuthError;
use crate::presign::{PresignRequest, PresignedUrl, RequestPresigner};
use crate::session::{SessionAuthenticator, SessionClaims};
use crate::webhook::WebhookCodec;

/// Longest lifetime a presigned URL may be issued with (seven days).
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// Session, storage, and webhook trust operations behind one handle.
///
/// Storage settings are optional: a facade without them still serves
/// sessions and webhooks, and every presign call reports the missing setting.
#[derive(Debug, Clone)]
pub struct TrustLayer {
    sessions: SessionAuthenticator,
    presigner: Result<RequestPresigner, ConfigError>,
    provider: StorageProvider,
    webhooks: WebhookCodec,
    webhook_secrets: BTreeMap<String, Secret>,
    webhook_tolerance_secs: u64,
}

impl TrustLayer {
    /// Build the facade against the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when no session secret is
    /// configured.
    pub fn from_config(config: &TrustConfig) -> ConfigResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build the facade against an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when no session secret is
    /// configured or a named webhook secret is empty.
    pub fn with_clock(config: &TrustConfig, clock: Arc<dyn Clock>) -> ConfigResult<Self> {
        let jwt_secret = config
            .jwt_secret
            .clone()
            .ok_or(ConfigError::MissingSecret("JWT_SECRET"))?;
        let sessions = SessionAuthenticator::new(jwt_secret, Arc::clone(&clock))?
            .with_default_ttl(config.session_ttl_secs);

        if let Some(source) = config
            .webhook_secrets
            .iter()
            .find_map(|(source, secret)| secret.is_empty().then_some(source))
        {
            warn!(source, "empty webhook secret");
            return Err(ConfigError::MissingSecret("WEBHOOK_SECRET"));
        }

        let presigner = RequestPresigner::from_config(&config.storage, Arc::clone(&clock));
        match &presigner {
            Ok(p) => info!(
                provider = %config.storage.provider,
                host = p.target().host(),
                "object storage presigning enabled"
            ),
            Err(e) => warn!(error = %e, "object storage presigning disabled"),
        }

        Ok(Self {
            sessions,
            presigner,
            provider: config.storage.provider,
            webhooks: WebhookCodec::new(clock),
            webhook_secrets: config.webhook_secrets.clone(),
            webhook_tolerance_secs: config.webhook_tolerance_secs,
        })
    }

    /// Issue a session token.
    #[must_use]
    pub fn issue_session(&self, claims: SessionClaims) -> String {
        self.sessions.issue(claims)
    }

    /// Lifetime given to sessions issued without an explicit expiry.
    #[must_use]
    pub fn session_ttl_secs(&self) -> u64 {
        self.sessions.default_ttl_secs()
    }

    /// Verify a session token; `None` on any failure.
    #[must_use]
    pub fn verify_session(&self, token: Option<&str>) -> Option<SessionClaims> {
        self.sessions.verify(token)
    }

    /// The configured storage provider.
    #[must_use]
    pub fn storage_provider(&self) -> StorageProvider {
        self.provider
    }

    /// Whether presigning is available.
    #[must_use]
    pub fn storage_configured(&self) -> bool {
        self.presigner.is_ok()
    }

    /// Presign an upload.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when storage is not configured,
    /// checked first, then [`AuthError::EmptyObjectKey`] or
    /// [`AuthError::InvalidExpiry`] outside `1..=604800`.
    pub fn presign_put(
        &self,
        object_key: &str,
        content_type: Option<&str>,
        expiry_secs: u64,
    ) -> Result<PresignedUrl, AuthError> {
        self.presign(&PresignRequest::put(
            object_key,
            content_type.map(str::to_owned),
            expiry_secs,
        ))
    }

    /// Presign a download.
    ///
    /// # Errors
    ///
    /// Same as [`TrustLayer::presign_put`].
    pub fn presign_get(
        &self,
        object_key: &str,
        expiry_secs: u64,
    ) -> Result<PresignedUrl, AuthError> {
        self.presign(&PresignRequest::get(object_key, expiry_secs))
    }

    fn presign(&self, request: &PresignRequest) -> Result<PresignedUrl, AuthError> {
        let presigner = self.presigner.as_ref().map_err(|e| {
            warn!(error = %e, method = %request.method, "presign refused");
            AuthError::Configuration(e.clone())
        })?;
        if request.object_key.is_empty() {
            return Err(AuthError::EmptyObjectKey);
        }
        if !(1..=MAX_PRESIGN_EXPIRY_SECS).contains(&request.expiry_secs) {
            return Err(AuthError::InvalidExpiry(request.expiry_secs));
        }
        Ok(presigner.presign(request))
    }

    /// Verify an inbound webhook against an explicit secret and tolerance.
    #[must_use]
    pub fn verify_webhook(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        secret: &Secret,
        tolerance_secs: u64,
    ) -> bool {
        self.webhooks
            .verify_inbound(raw_body, signature_header, secret, tolerance_secs)
    }

    /// Verify an inbound webhook from a named source (`stripe`, ...) with the
    /// configured tolerance. Unknown sources are rejected.
    #[must_use]
    pub fn verify_webhook_from(
        &self,
        source: &str,
        raw_body: &[u8],
        signature_header: &str,
    ) -> bool {
        let Some(secret) = self.webhook_secret(source) else {
            warn!(source, "no webhook secret configured");
            return false;
        };
        self.verify_webhook(raw_body, signature_header, secret, self.webhook_tolerance_secs)
    }

    /// Sign an outbound webhook payload; returns 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] for an empty secret.
    pub fn sign_webhook(&self, payload: &[u8], secret: &Secret) -> Result<String, AuthError> {
        self.webhooks.sign_outbound(payload, secret)
    }

    /// Sign an outbound payload as a `t=<now>,v1=<hex>` header.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] for an empty secret.
    pub fn sign_webhook_timestamped(
        &self,
        payload: &[u8],
        secret: &Secret,
    ) -> Result<String, AuthError> {
        self.webhooks.sign_outbound_timestamped(payload, secret)
    }

    /// The secret configured for a named webhook source.
    #[must_use]
    pub fn webhook_secret(&self, source: &str) -> Option<&Secret> {
        self.webhook_secrets.get(source)
    }
}
