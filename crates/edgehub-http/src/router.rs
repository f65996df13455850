//! Request router.
//!
//! The route table is small and fixed:
//!
//! ```text
//! GET  /_health
//! GET  /admin
//! GET  /api/me
//! POST /api/auth/refresh
//! POST /api/auth/logout
//! POST /api/storage/sign
//! POST /api/storage/sign-get
//! POST /api/stripe/webhook
//! ```

use http::Method;

use crate::error::HttpError;

/// A resolved route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Liveness check.
    Health,
    /// Owner and admin area.
    Admin,
    /// The current session's subject and role.
    Me,
    /// Reissue the current session and set its cookie.
    RefreshSession,
    /// Clear the session cookie.
    Logout,
    /// Presign an upload.
    StorageSign,
    /// Presign a download.
    StorageSignGet,
    /// Inbound Stripe-style webhook.
    StripeWebhook,
}

impl Route {
    /// Whether the route requires a valid session.
    #[must_use]
    pub fn requires_session(self) -> bool {
        matches!(self, Self::StorageSign | Self::StorageSignGet)
    }
}

/// Resolve a route from the method and path.
///
/// # Errors
///
/// Returns [`HttpError::NotFound`] for unknown paths and
/// [`HttpError::MethodNotAllowed`] for a known path with the wrong method.
pub fn resolve_route(method: &Method, path: &str) -> Result<Route, HttpError> {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };

    let (route, allowed) = match path {
        "/_health" => (Route::Health, Method::GET),
        "/admin" => (Route::Admin, Method::GET),
        "/api/me" => (Route::Me, Method::GET),
        "/api/auth/refresh" => (Route::RefreshSession, Method::POST),
        "/api/auth/logout" => (Route::Logout, Method::POST),
        "/api/storage/sign" => (Route::StorageSign, Method::POST),
        "/api/storage/sign-get" => (Route::StorageSignGet, Method::POST),
        "/api/stripe/webhook" => (Route::StripeWebhook, Method::POST),
        _ => return Err(HttpError::NotFound),
    };

    if *method == allowed || (*method == Method::HEAD && allowed == Method::GET) {
        Ok(route)
    } else {
        Err(HttpError::MethodNotAllowed)
    }
}
