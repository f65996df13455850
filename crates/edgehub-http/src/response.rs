//! JSON response and session cookie helpers.

use http::HeaderValue;
use serde::Serialize;

use crate::body::TrustResponseBody;
use crate::error::HttpError;
use crate::extract::SESSION_COOKIE;

/// Content type of every response body.
pub const CONTENT_TYPE: &str = "application/json";

/// Serialize `value` into a response with `status`.
#[must_use]
pub fn json_response<T: Serialize>(
    status: http::StatusCode,
    value: &T,
) -> http::Response<TrustResponseBody> {
    // Response payloads are plain structs and `json!` values.
    let json = serde_json::to_vec(value).expect("JSON serialization of response cannot fail");

    http::Response::builder()
        .status(status)
        .header("content-type", CONTENT_TYPE)
        .body(TrustResponseBody::from_bytes(json))
        .expect("valid JSON response")
}

/// `{"ok":false,"error":"..."}` with the error's status.
#[must_use]
pub fn error_to_response(error: &HttpError) -> http::Response<TrustResponseBody> {
    json_response(
        error.status_code(),
        &serde_json::json!({
            "ok": false,
            "error": error.to_string(),
        }),
    )
}

/// `Set-Cookie` value carrying `token` for `max_age_secs`.
///
/// # Errors
///
/// Returns [`HttpError::Internal`] if the token is not a valid header value.
pub fn session_cookie(token: &str, max_age_secs: u64) -> Result<HeaderValue, HttpError> {
    HeaderValue::try_from(format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    ))
    .map_err(|_| HttpError::Internal)
}

/// `Set-Cookie` value that expires the session cookie.
#[must_use]
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0")
}

/// Append a `Set-Cookie` header to `response`.
#[must_use]
pub fn with_cookie(
    mut response: http::Response<TrustResponseBody>,
    cookie: HeaderValue,
) -> http::Response<TrustResponseBody> {
    response
        .headers_mut()
        .append(http::header::SET_COOKIE, cookie);
    response
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_should_render_generic_unauthorized_body() {
        let resp = error_to_response(&HttpError::Unauthorized);
        assert_eq!(resp.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get("content-type").unwrap(), CONTENT_TYPE);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "unauthorized"}));
    }

    #[test]
    fn test_should_build_session_cookie() {
        let cookie = session_cookie("a.b.c", 2_592_000).unwrap();
        assert_eq!(
            cookie,
            "token=a.b.c; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=2592000"
        );
        assert!(session_cookie("bad\ntoken", 60).is_err());
    }

    #[test]
    fn test_should_expire_session_cookie() {
        let resp = with_cookie(
            json_response(http::StatusCode::OK, &serde_json::json!({ "ok": true })),
            clear_session_cookie(),
        );
        let cookie = resp.headers().get(http::header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("token=;"));
        assert!(cookie.to_str().unwrap().ends_with("Max-Age=0"));
    }

    #[test]
    fn test_should_map_role_failures_to_403() {
        let resp = error_to_response(&HttpError::Forbidden);
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_should_map_configuration_errors_to_500() {
        let resp = error_to_response(&HttpError::NotConfigured("storage"));
        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
