//! Credential extraction from request headers.

use http::HeaderMap;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Header carrying inbound Stripe-style webhook signatures.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// The session token from the `token` cookie, or else from
/// `Authorization: Bearer <token>`.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, SESSION_COOKIE).or_else(|| bearer_token(headers))
}

/// The value of cookie `name`, across every `Cookie` header.
#[must_use]
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// The credential of an `Authorization: Bearer` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// A header value as UTF-8, if present.
#[must_use]
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_should_read_token_cookie() {
        let map = headers(&[("cookie", "theme=dark; token=abc.def.ghi; other=1")]);
        assert_eq!(session_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_should_search_every_cookie_header() {
        let map = headers(&[("cookie", "a=1"), ("cookie", "token=xyz")]);
        assert_eq!(session_token(&map), Some("xyz"));
    }

    #[test]
    fn test_should_fall_back_to_bearer() {
        let map = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(session_token(&map), Some("abc.def.ghi"));

        let map = headers(&[("cookie", "token="), ("authorization", "bearer t")]);
        assert_eq!(session_token(&map), Some("t"));
    }

    #[test]
    fn test_should_prefer_cookie_over_bearer() {
        let map = headers(&[("cookie", "token=c"), ("authorization", "Bearer b")]);
        assert_eq!(session_token(&map), Some("c"));
    }

    #[test]
    fn test_should_ignore_other_schemes() {
        assert_eq!(session_token(&headers(&[("authorization", "Basic dXNlcg==")])), None);
        assert_eq!(session_token(&headers(&[("authorization", "Bearer ")])), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
