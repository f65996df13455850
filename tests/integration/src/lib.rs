//! Integration tests for the EdgeHub server.
//!
//! These tests require a running server at `localhost:8080`, started with
//! the same `JWT_SECRET` and `STRIPE_WEBHOOK_SECRET` the tests use. They
//! are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! JWT_SECRET=integration-jwt STRIPE_WEBHOOK_SECRET=whsec_integration edgehub-server &
//! cargo test -p edgehub-integration -- --ignored
//! ```

use std::sync::{Arc, Once};

use edgehub_auth::session::{Role, SessionAuthenticator, SessionClaims};
use edgehub_auth::webhook::signature_header;
use edgehub_core::{Secret, SystemClock};

mod test_health;
mod test_session;
mod test_storage;
mod test_webhook;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of the server under test.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("EDGEHUB_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Absolute URL of `path` on the server under test.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", endpoint_url())
}

/// HTTP client for the server under test.
#[must_use]
pub fn client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

fn env_secret(name: &str, default: &str) -> Secret {
    Secret::new(std::env::var(name).unwrap_or_else(|_| default.to_owned()))
}

/// Session secret shared with the server.
#[must_use]
pub fn jwt_secret() -> Secret {
    env_secret("JWT_SECRET", "integration-jwt")
}

/// Stripe webhook secret shared with the server.
#[must_use]
pub fn stripe_secret() -> Secret {
    env_secret("STRIPE_WEBHOOK_SECRET", "whsec_integration")
}

/// Issue a session token the server accepts.
#[must_use]
pub fn session_token(email: &str, role: Role) -> String {
    let sessions = SessionAuthenticator::new(jwt_secret(), Arc::new(SystemClock))
        .expect("integration JWT secret is not empty");
    sessions.issue(SessionClaims::new(email, role))
}

/// A `stripe-signature` header for `payload` signed now.
#[must_use]
pub fn stripe_signature(payload: &[u8]) -> String {
    signature_header(chrono::Utc::now().timestamp(), payload, &stripe_secret())
        .expect("integration webhook secret is not empty")
}

/// Unique object key for one test.
#[must_use]
pub fn test_object_key(prefix: &str) -> String {
    format!("it/{prefix}-{}", uuid::Uuid::new_v4().simple())
}
