//! Route handlers.
//!
//! Each handler takes the facade, the request head, and the raw body bytes.
//! Webhook bodies are passed to the verifier exactly as received.

use bytes::Bytes;
use edgehub_auth::session::{Role, SessionClaims};
use edgehub_auth::{AuthError, PresignedUrl, TrustLayer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::HttpError;
use crate::extract::{STRIPE_SIGNATURE_HEADER, header_str, session_token};
use crate::response::{clear_session_cookie, json_response, session_cookie, with_cookie};
use crate::service::TrustHttpConfig;

type Response = http::Response<crate::body::TrustResponseBody>;

/// Webhook source name of the Stripe-style route.
pub const STRIPE_SOURCE: &str = "stripe";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    key: Option<String>,
    content_type: Option<String>,
}

#[derive(Serialize)]
struct SignResponse<'a> {
    ok: bool,
    key: &'a str,
    provider: &'a str,
    #[serde(flatten)]
    presigned: &'a PresignedUrl,
}

/// Roles allowed into `/admin`.
pub const ADMIN_ROLES: &[Role] = &[Role::Owner, Role::Admin];

/// `GET /_health`.
#[must_use]
pub fn health(trust: &TrustLayer) -> Response {
    json_response(
        http::StatusCode::OK,
        &serde_json::json!({
            "ok": true,
            "status": "running",
            "storage": trust.storage_configured(),
        }),
    )
}

/// `GET /api/me`: who the presented session belongs to.
///
/// # Errors
///
/// Returns [`HttpError::Unauthorized`] without a valid session.
pub fn me(trust: &TrustLayer, parts: &http::request::Parts) -> Result<Response, HttpError> {
    let claims = require_session(trust, parts)?;
    Ok(user_response(&claims))
}

/// `GET /admin`: owner and admin only.
///
/// # Errors
///
/// Returns [`HttpError::Unauthorized`] without a valid session and
/// [`HttpError::Forbidden`] for any other role.
pub fn admin(trust: &TrustLayer, parts: &http::request::Parts) -> Result<Response, HttpError> {
    let claims = require_role(trust, parts, ADMIN_ROLES)?;
    Ok(user_response(&claims))
}

/// `POST /api/auth/refresh`: reissue the session and set its cookie.
///
/// # Errors
///
/// Returns [`HttpError::Unauthorized`] without a valid session.
pub fn refresh_session(
    trust: &TrustLayer,
    parts: &http::request::Parts,
) -> Result<Response, HttpError> {
    let claims = require_session(trust, parts)?;
    let token = trust.issue_session(SessionClaims::new(claims.subject.clone(), claims.role));
    let cookie = session_cookie(&token, trust.session_ttl_secs())?;
    debug!(role = %claims.role, "session refreshed");
    Ok(with_cookie(user_response(&claims), cookie))
}

/// `POST /api/auth/logout`: expire the session cookie.
#[must_use]
pub fn logout() -> Response {
    with_cookie(
        json_response(http::StatusCode::OK, &serde_json::json!({ "ok": true })),
        clear_session_cookie(),
    )
}

/// `POST /api/storage/sign`: presign an upload.
///
/// The key defaults to `uploads/<uuid>` and the content type to
/// `application/octet-stream`.
///
/// # Errors
///
/// Returns [`HttpError::BadRequest`] for an unparsable body and
/// [`HttpError::NotConfigured`] when storage is not configured.
pub fn storage_sign(
    trust: &TrustLayer,
    config: &TrustHttpConfig,
    body: &Bytes,
) -> Result<Response, HttpError> {
    let request = parse_sign_request(body)?;
    let key = request
        .key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| format!("uploads/{}", uuid::Uuid::new_v4()));

    let presigned = trust
        .presign_put(&key, request.content_type.as_deref(), config.put_expiry_secs)
        .map_err(presign_error)?;
    Ok(sign_response(trust, &key, &presigned))
}

/// `POST /api/storage/sign-get`: presign a download.
///
/// # Errors
///
/// Returns [`HttpError::BadRequest`] when `key` is missing and
/// [`HttpError::NotConfigured`] when storage is not configured.
pub fn storage_sign_get(
    trust: &TrustLayer,
    config: &TrustHttpConfig,
    body: &Bytes,
) -> Result<Response, HttpError> {
    if !trust.storage_configured() {
        return Err(HttpError::NotConfigured("storage"));
    }
    let request = parse_sign_request(body)?;
    let key = request
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| HttpError::BadRequest("key required".to_owned()))?;

    let presigned = trust
        .presign_get(&key, config.get_expiry_secs)
        .map_err(presign_error)?;
    Ok(sign_response(trust, &key, &presigned))
}

/// `POST /api/stripe/webhook`: verify an inbound delivery.
///
/// # Errors
///
/// Returns [`HttpError::NotConfigured`] without a `stripe` secret and
/// [`HttpError::Unauthorized`] for any signature failure.
pub fn stripe_webhook(
    trust: &TrustLayer,
    parts: &http::request::Parts,
    body: &Bytes,
) -> Result<Response, HttpError> {
    if trust.webhook_secret(STRIPE_SOURCE).is_none() {
        warn!("stripe webhook received without a configured secret");
        return Err(HttpError::NotConfigured("webhook"));
    }

    let Some(signature) = header_str(&parts.headers, STRIPE_SIGNATURE_HEADER) else {
        debug!(reason = "malformed", "webhook rejected");
        return Err(HttpError::Unauthorized);
    };
    if !trust.verify_webhook_from(STRIPE_SOURCE, body, signature) {
        return Err(HttpError::Unauthorized);
    }

    // Parsed only after verification, for the log line.
    let event: serde_json::Value = serde_json::from_slice(body).unwrap_or_default();
    info!(
        event_id = event["id"].as_str().unwrap_or_default(),
        event_type = event["type"].as_str().unwrap_or_default(),
        bytes = body.len(),
        "webhook accepted"
    );

    Ok(json_response(
        http::StatusCode::OK,
        &serde_json::json!({ "received": true }),
    ))
}

/// Verify the request's session, if any.
///
/// # Errors
///
/// Returns [`HttpError::Unauthorized`] for every failure.
pub fn require_session(
    trust: &TrustLayer,
    parts: &http::request::Parts,
) -> Result<SessionClaims, HttpError> {
    trust
        .verify_session(session_token(&parts.headers))
        .ok_or(HttpError::Unauthorized)
}

/// Verify the request's session and check its role against `allowed`.
///
/// # Errors
///
/// Returns [`HttpError::Unauthorized`] without a valid session and
/// [`HttpError::Forbidden`] when the role is not in `allowed`.
pub fn require_role(
    trust: &TrustLayer,
    parts: &http::request::Parts,
    allowed: &[Role],
) -> Result<SessionClaims, HttpError> {
    let claims = require_session(trust, parts)?;
    if !allowed.contains(&claims.role) {
        debug!(role = %claims.role, path = parts.uri.path(), "role not permitted");
        return Err(HttpError::Forbidden);
    }
    Ok(claims)
}

fn user_response(claims: &SessionClaims) -> Response {
    json_response(
        http::StatusCode::OK,
        &serde_json::json!({
            "ok": true,
            "user": { "email": claims.subject, "role": claims.role },
        }),
    )
}

fn parse_sign_request(body: &Bytes) -> Result<SignRequest, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SignRequest::default());
    }
    serde_json::from_slice(body).map_err(|_| HttpError::BadRequest("invalid JSON body".to_owned()))
}

fn presign_error(error: AuthError) -> HttpError {
    match error {
        AuthError::Configuration(_) => HttpError::NotConfigured("storage"),
        other => HttpError::BadRequest(other.to_string()),
    }
}

fn sign_response(trust: &TrustLayer, key: &str, presigned: &PresignedUrl) -> Response {
    let body = SignResponse {
        ok: true,
        key,
        provider: trust.storage_provider().as_str(),
        presigned,
    };
    json_response(http::StatusCode::OK, &body)
}
