//! Presigned URL issuance for S3-compatible object stores.
//!
//! A presigned URL authorizes exactly one method on one object until
//! `X-Amz-Date + X-Amz-Expires`. The storage provider re-derives the canonical
//! request from the URL and the signed headers, so every byte produced here
//! must match what AWS SigV4 prescribes:
//!
//! - signed headers are always `host;x-amz-content-sha256;x-amz-date`
//! - the payload hash is the SHA-256 of the empty string
//! - query parameters are encoded and sorted, never taken in insertion order
//! - the object key is encoded per segment, keeping `/`
//!
//! The storage secret never leaves the process; only the derived signature
//! does.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use edgehub_core::{
    AddressingStyle, Clock, ConfigError, ConfigResult, Secret, StorageConfig, StorageProvider,
};
use http::Uri;
use serde::Serialize;
use tracing::debug;

use crate::canonical::{build_canonical_request, build_query_from_params, encode_uri_path};
use crate::sigv4::{
    ALGORITHM, S3_SERVICE, build_string_to_sign, compute_signature, credential_scope,
    derive_signing_key, format_amz_date, hash_canonical_request,
};

/// Hex SHA-256 of the empty payload.
pub const EMPTY_PAYLOAD_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Header names covered by every presigned signature, in canonical order.
pub const SIGNED_HEADER_NAMES: [&str; 3] = ["host", "x-amz-content-sha256", "x-amz-date"];

/// `X-Amz-SignedHeaders` value matching [`SIGNED_HEADER_NAMES`].
pub const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Content type sent with uploads when the caller does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP method a presigned URL authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresignMethod {
    /// Download an object.
    Get,
    /// Upload an object.
    Put,
}

impl PresignMethod {
    /// The method line of the canonical request.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for PresignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single presign call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Method to authorize.
    pub method: PresignMethod,
    /// Object key, unencoded.
    pub object_key: String,
    /// Content type the uploader must send (PUT only).
    pub content_type: Option<String>,
    /// Lifetime of the URL in seconds.
    pub expiry_secs: u64,
}

impl PresignRequest {
    /// A download request.
    pub fn get(object_key: impl Into<String>, expiry_secs: u64) -> Self {
        Self {
            method: PresignMethod::Get,
            object_key: object_key.into(),
            content_type: None,
            expiry_secs,
        }
    }

    /// An upload request.
    pub fn put(
        object_key: impl Into<String>,
        content_type: Option<String>,
        expiry_secs: u64,
    ) -> Self {
        Self {
            method: PresignMethod::Put,
            object_key: object_key.into(),
            content_type,
            expiry_secs,
        }
    }
}

/// A signed URL plus what its user needs to send alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrl {
    /// The full URL including `X-Amz-Signature`.
    pub url: String,
    /// Headers the uploader should send (PUT only): `content-type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// The signing instant, `YYYYMMDDTHHMMSSZ`.
    pub amz_date: String,
    /// The payload hash that was signed.
    pub payload_hash: String,
    /// Unix second after which the provider rejects the URL.
    pub expires_at: i64,
}

impl PresignedUrl {
    /// Signed header values the client must send with the request.
    ///
    /// `host` is implied by the URL.
    #[must_use]
    pub fn required_headers(&self) -> [(&'static str, &str); 2] {
        [
            ("x-amz-content-sha256", self.payload_hash.as_str()),
            ("x-amz-date", self.amz_date.as_str()),
        ]
    }
}

/// Where presigned requests are sent: scheme, host, and the path prefix that
/// carries the bucket in path-style addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    scheme: String,
    host: String,
    path_prefix: String,
}

impl StorageTarget {
    /// Resolve the target from storage settings.
    ///
    /// The host comes from, in order: the origin of an explicit endpoint, the
    /// R2 account host, or the AWS regional host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] when the bucket is unset or an
    /// R2 target has neither endpoint nor account id, and
    /// [`ConfigError::InvalidValue`] for an endpoint that is not a plain
    /// `http`/`https` origin.
    pub fn from_config(config: &StorageConfig) -> ConfigResult<Self> {
        let bucket = non_empty(config.bucket.as_deref())
            .ok_or(ConfigError::MissingSetting("S3_BUCKET"))?;

        let (scheme, host) = match non_empty(config.endpoint.as_deref()) {
            Some(endpoint) => parse_endpoint_origin(endpoint)?,
            None => match config.provider {
                StorageProvider::R2 => {
                    let account = non_empty(config.account_id.as_deref())
                        .ok_or(ConfigError::MissingSetting("R2_ACCOUNT_ID"))?;
                    ("https".to_owned(), format!("{account}.r2.cloudflarestorage.com"))
                }
                StorageProvider::Aws => {
                    let host = match config.effective_region() {
                        "us-east-1" => "s3.amazonaws.com".to_owned(),
                        region => format!("s3.{region}.amazonaws.com"),
                    };
                    ("https".to_owned(), host)
                }
            },
        };

        Ok(match config.addressing {
            AddressingStyle::Path => Self {
                scheme,
                host,
                path_prefix: format!("/{bucket}"),
            },
            AddressingStyle::VirtualHosted => Self {
                scheme,
                host: format!("{bucket}.{host}"),
                path_prefix: String::new(),
            },
        })
    }

    /// Host header value, including a non-default port.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Canonical (encoded) URI path of `object_key`.
    #[must_use]
    pub fn canonical_uri(&self, object_key: &str) -> String {
        format!("{}/{}", self.path_prefix, encode_uri_path(object_key))
    }

    fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// Produces SigV4 presigned URLs for one bucket.
///
/// Built once from configuration and shared freely; each call reads the
/// clock once.
#[derive(Clone)]
pub struct RequestPresigner {
    access_key_id: String,
    secret_key: Secret,
    region: String,
    target: StorageTarget,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RequestPresigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPresigner")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl RequestPresigner {
    /// Build a presigner from storage settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid setting:
    /// access key, secret key, bucket, or endpoint.
    pub fn from_config(config: &StorageConfig, clock: Arc<dyn Clock>) -> ConfigResult<Self> {
        let access_key_id = non_empty(config.access_key_id.as_deref())
            .ok_or(ConfigError::MissingSetting("S3_ACCESS_KEY"))?
            .to_owned();
        let secret_key = config
            .secret_access_key
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret("S3_SECRET_KEY"))?;
        let target = StorageTarget::from_config(config)?;

        Ok(Self {
            access_key_id,
            secret_key,
            region: config.effective_region().to_owned(),
            target,
            clock,
        })
    }

    /// The resolved storage target.
    #[must_use]
    pub fn target(&self) -> &StorageTarget {
        &self.target
    }

    /// Sign `request` at the current instant.
    #[must_use]
    pub fn presign(&self, request: &PresignRequest) -> PresignedUrl {
        self.presign_at(request, self.clock.now())
    }

    /// Sign an upload URL. The returned headers carry `content-type`.
    #[must_use]
    pub fn presign_put(
        &self,
        object_key: &str,
        content_type: Option<&str>,
        expiry_secs: u64,
    ) -> PresignedUrl {
        self.presign(&PresignRequest::put(
            object_key,
            content_type.map(str::to_owned),
            expiry_secs,
        ))
    }

    /// Sign a download URL.
    #[must_use]
    pub fn presign_get(&self, object_key: &str, expiry_secs: u64) -> PresignedUrl {
        self.presign(&PresignRequest::get(object_key, expiry_secs))
    }

    /// Sign `request` as of `now`. Deterministic for identical inputs.
    #[must_use]
    pub fn presign_at(&self, request: &PresignRequest, now: DateTime<Utc>) -> PresignedUrl {
        let amz_date = format_amz_date(&now);
        let date = &amz_date[..8];
        let scope = credential_scope(date, &self.region, S3_SERVICE);

        let canonical_uri = self.target.canonical_uri(&request.object_key);
        let canonical_query = self.canonical_query(&scope, &amz_date, request.expiry_secs);
        let canonical_request = self.canonical_request(
            request.method,
            &canonical_uri,
            &canonical_query,
            &amz_date,
        );

        let string_to_sign = build_string_to_sign(
            &amz_date,
            &scope,
            &hash_canonical_request(&canonical_request),
        );
        let signing_key =
            derive_signing_key(self.secret_key.expose(), date, &self.region, S3_SERVICE);
        let signature = compute_signature(&signing_key, &string_to_sign);

        let headers = match request.method {
            PresignMethod::Put => {
                let content_type = request
                    .content_type
                    .clone()
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
                Some(BTreeMap::from([("content-type".to_owned(), content_type)]))
            }
            PresignMethod::Get => None,
        };

        let expires_at = now
            .timestamp()
            .saturating_add(i64::try_from(request.expiry_secs).unwrap_or(i64::MAX));

        debug!(
            method = %request.method,
            host = %self.target.host,
            expiry_secs = request.expiry_secs,
            expires_at,
            "presigned storage request"
        );

        PresignedUrl {
            url: format!(
                "{}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}",
                self.target.origin()
            ),
            headers,
            amz_date,
            payload_hash: EMPTY_PAYLOAD_HASH.to_owned(),
            expires_at,
        }
    }

    fn canonical_query(&self, scope: &str, amz_date: &str, expiry_secs: u64) -> String {
        let credential = format!("{}/{scope}", self.access_key_id);
        let expires = expiry_secs.to_string();
        build_query_from_params(&[
            ("X-Amz-Algorithm", ALGORITHM),
            ("X-Amz-Credential", &credential),
            ("X-Amz-Date", amz_date),
            ("X-Amz-Expires", &expires),
            ("X-Amz-SignedHeaders", SIGNED_HEADERS),
        ])
    }

    fn canonical_request(
        &self,
        method: PresignMethod,
        canonical_uri: &str,
        canonical_query: &str,
        amz_date: &str,
    ) -> String {
        build_canonical_request(
            method.as_str(),
            canonical_uri,
            canonical_query,
            &[
                ("host", self.target.host()),
                ("x-amz-content-sha256", EMPTY_PAYLOAD_HASH),
                ("x-amz-date", amz_date),
            ],
            &SIGNED_HEADER_NAMES,
            EMPTY_PAYLOAD_HASH,
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Reduce an endpoint URL to `(scheme, host[:port])`, dropping default ports
/// and any path.
fn parse_endpoint_origin(endpoint: &str) -> ConfigResult<(String, String)> {
    let invalid = || ConfigError::InvalidValue {
        name: "S3_ENDPOINT",
        value: endpoint.to_owned(),
    };

    let uri: Uri = endpoint.parse().map_err(|_| invalid())?;
    let scheme = uri.scheme_str().ok_or_else(invalid)?.to_ascii_lowercase();
    let authority = uri.authority().ok_or_else(invalid)?;
    if authority.as_str().contains('@') {
        return Err(invalid());
    }

    let default_port = match scheme.as_str() {
        "https" => 443,
        "http" => 80,
        _ => return Err(invalid()),
    };
    let host = authority.host().to_ascii_lowercase();
    if host.is_empty() {
        return Err(invalid());
    }

    let host = match authority.port_u16() {
        Some(port) if port != default_port => format!("{host}:{port}"),
        _ => host,
    };
    Ok((scheme, host))
}
