//! Process-wide configuration for the trust layer.
//!
//! All configuration is driven by environment variables and read once at
//! startup. Secrets are wrapped in [`Secret`] and never leave this struct in
//! printable form.

use std::collections::{BTreeMap, HashMap};

use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{AddressingStyle, Secret, StorageProvider};

/// Prefix for additional named webhook secrets (`WEBHOOK_SECRET_GITHUB` → `github`).
const WEBHOOK_SECRET_PREFIX: &str = "WEBHOOK_SECRET_";

/// Object storage settings used by the presigner.
///
/// Every field is optional at load time. The presigner refuses to sign when
/// the access key, secret key, or bucket is missing.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct StorageConfig {
    /// Which S3-compatible provider is targeted.
    #[builder(default)]
    pub provider: StorageProvider,

    /// Access key id, embedded in `X-Amz-Credential`.
    #[builder(default, setter(strip_option, into))]
    pub access_key_id: Option<String>,

    /// Secret access key, used only to derive the signing key.
    #[builder(default, setter(strip_option))]
    pub secret_access_key: Option<Secret>,

    /// Bucket name.
    #[builder(default, setter(strip_option, into))]
    pub bucket: Option<String>,

    /// Signing region. Falls back to the provider default.
    #[builder(default, setter(strip_option, into))]
    pub region: Option<String>,

    /// Explicit endpoint; only its origin is used.
    #[builder(default, setter(strip_option, into))]
    pub endpoint: Option<String>,

    /// Cloudflare account id, used to build the R2 host when no endpoint is set.
    #[builder(default, setter(strip_option, into))]
    pub account_id: Option<String>,

    /// Path-style or virtual-hosted-style URLs.
    #[builder(default)]
    pub addressing: AddressingStyle,
}

impl StorageConfig {
    /// The region used in the credential scope.
    #[must_use]
    pub fn effective_region(&self) -> &str {
        self.region
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.provider.default_region())
    }
}

/// Global configuration for the trust layer and the server around it.
///
/// # Examples
///
/// ```
/// use edgehub_core::{Secret, TrustConfig};
///
/// let config = TrustConfig::builder()
///     .jwt_secret(Secret::new("dev-only"))
///     .build();
/// assert_eq!(config.webhook_tolerance_secs, 300);
/// assert_eq!(config.storage.effective_region(), "us-east-1");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct TrustConfig {
    /// Bind address for the HTTP server.
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Session token signing key.
    #[builder(default, setter(strip_option))]
    pub jwt_secret: Option<Secret>,

    /// Lifetime given to sessions whose claims carry no expiry.
    #[builder(default = 2_592_000)]
    pub session_ttl_secs: u64,

    /// Object storage settings.
    #[builder(default)]
    pub storage: StorageConfig,

    /// Named webhook shared secrets (`stripe`, `github`, ...).
    #[builder(default)]
    pub webhook_secrets: BTreeMap<String, Secret>,

    /// Accepted distance between a webhook timestamp and now.
    #[builder(default = 300)]
    pub webhook_tolerance_secs: u64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TrustConfig {
    /// Load configuration from the process environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    /// | `JWT_SECRET` | *(unset)* |
    /// | `SESSION_TTL_SECONDS` | `2592000` |
    /// | `S3_ACCESS_KEY`, `S3_SECRET_KEY`, `S3_BUCKET` | *(unset)* |
    /// | `S3_REGION` | provider default |
    /// | `S3_ENDPOINT` | *(unset)* |
    /// | `STORAGE_PROVIDER` | `aws` |
    /// | `R2_ACCOUNT_ID` | *(unset)* |
    /// | `S3_ADDRESSING` | `path` |
    /// | `STRIPE_WEBHOOK_SECRET` | *(unset)* |
    /// | `WEBHOOK_SECRET_<NAME>` | *(unset)* |
    /// | `WEBHOOK_TOLERANCE_SECONDS` | `300` |
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> ConfigResult<Self> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .collect();
        let get = |name: &str| vars.get(name).cloned();

        let mut config = Self::default();

        if let Some(v) = get("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v;
        }
        config.jwt_secret = get("JWT_SECRET").map(Secret::new);
        if let Some(v) = get("SESSION_TTL_SECONDS") {
            config.session_ttl_secs = parse_u64("SESSION_TTL_SECONDS", &v)?;
        }

        let storage = &mut config.storage;
        if let Some(v) = get("STORAGE_PROVIDER") {
            storage.provider = v.parse()?;
        }
        if let Some(v) = get("S3_ADDRESSING") {
            storage.addressing = v.parse()?;
        }
        storage.access_key_id = get("S3_ACCESS_KEY");
        storage.secret_access_key = get("S3_SECRET_KEY").map(Secret::new);
        storage.bucket = get("S3_BUCKET");
        storage.region = get("S3_REGION");
        storage.endpoint = get("S3_ENDPOINT");
        storage.account_id = get("R2_ACCOUNT_ID");

        if let Some(v) = get("STRIPE_WEBHOOK_SECRET") {
            config
                .webhook_secrets
                .insert("stripe".to_owned(), Secret::new(v));
        }
        for (name, value) in &vars {
            if let Some(source) = name.strip_prefix(WEBHOOK_SECRET_PREFIX) {
                if !source.is_empty() {
                    config
                        .webhook_secrets
                        .insert(source.to_ascii_lowercase(), Secret::new(value));
                }
            }
        }
        if let Some(v) = get("WEBHOOK_TOLERANCE_SECONDS") {
            config.webhook_tolerance_secs = parse_u64("WEBHOOK_TOLERANCE_SECONDS", &v)?;
        }

        tracing::debug!(
            gateway_listen = %config.gateway_listen,
            storage_provider = %config.storage.provider,
            webhook_sources = config.webhook_secrets.len(),
            has_jwt_secret = config.jwt_secret.is_some(),
            "loaded trust configuration"
        );

        Ok(config)
    }
}

fn parse_u64(name: &'static str, value: &str) -> ConfigResult<u64> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_owned(),
    })
}
