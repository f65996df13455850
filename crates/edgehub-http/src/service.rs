//! Hyper `Service` binding the routes to a [`TrustLayer`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use edgehub_auth::TrustLayer;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use tracing::debug;

use crate::body::TrustResponseBody;
use crate::error::HttpError;
use crate::handlers;
use crate::response::{CONTENT_TYPE, error_to_response};
use crate::router::{Route, resolve_route};

/// Limits and lifetimes applied by the HTTP layer.
#[derive(Debug, Clone)]
pub struct TrustHttpConfig {
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Lifetime of presigned upload URLs.
    pub put_expiry_secs: u64,
    /// Lifetime of presigned download URLs.
    pub get_expiry_secs: u64,
}

impl Default for TrustHttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            put_expiry_secs: 900,
            get_expiry_secs: 300,
        }
    }
}

/// Hyper `Service` for the EdgeHub routes.
#[derive(Debug, Clone)]
pub struct TrustHttpService {
    trust: Arc<TrustLayer>,
    config: Arc<TrustHttpConfig>,
}

impl TrustHttpService {
    /// Create a new `TrustHttpService`.
    pub fn new(trust: Arc<TrustLayer>, config: TrustHttpConfig) -> Self {
        Self {
            trust,
            config: Arc::new(config),
        }
    }

    /// Route and answer a request whose body is already buffered.
    #[must_use]
    pub fn handle(
        &self,
        parts: &http::request::Parts,
        body: &Bytes,
    ) -> http::Response<TrustResponseBody> {
        let result = resolve_route(&parts.method, parts.uri.path())
            .and_then(|route| self.dispatch(route, parts, body));

        let mut response = result.unwrap_or_else(|err| error_to_response(&err));
        if parts.method == http::Method::HEAD {
            response = response.map(|_| TrustResponseBody::empty());
        }
        debug!(
            method = %parts.method,
            path = parts.uri.path(),
            status = response.status().as_u16(),
            "handled request"
        );
        response
    }

    fn dispatch(
        &self,
        route: Route,
        parts: &http::request::Parts,
        body: &Bytes,
    ) -> Result<http::Response<TrustResponseBody>, HttpError> {
        if route.requires_session() {
            handlers::require_session(&self.trust, parts)?;
        }

        match route {
            Route::Health => Ok(handlers::health(&self.trust)),
            Route::Admin => handlers::admin(&self.trust, parts),
            Route::Me => handlers::me(&self.trust, parts),
            Route::RefreshSession => handlers::refresh_session(&self.trust, parts),
            Route::Logout => Ok(handlers::logout()),
            Route::StorageSign => handlers::storage_sign(&self.trust, &self.config, body),
            Route::StorageSignGet => handlers::storage_sign_get(&self.trust, &self.config, body),
            Route::StripeWebhook => handlers::stripe_webhook(&self.trust, parts, body),
        }
    }
}

impl hyper::service::Service<http::Request<Incoming>> for TrustHttpService {
    type Response = http::Response<TrustResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let response = match collect_body(incoming, service.config.max_body_bytes).await {
                Ok(body) => service.handle(&parts, &body),
                Err(err) => error_to_response(&err),
            };
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Collect the incoming body, refusing more than `limit` bytes.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, HttpError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                HttpError::PayloadTooLarge
            } else {
                debug!(error = %e, "failed to read request body");
                HttpError::Body
            }
        })
}

/// Add headers common to every response.
fn add_common_headers(
    mut response: http::Response<TrustResponseBody>,
    request_id: &str,
) -> http::Response<TrustResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }
    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));
    headers.insert("cache-control", http::HeaderValue::from_static("no-store"));
    headers.insert("server", http::HeaderValue::from_static("EdgeHub"));

    response
}
