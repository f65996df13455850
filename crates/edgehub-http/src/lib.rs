//! HTTP binding for the EdgeHub trust layer.
//!
//! This crate is the thin layer between hyper and
//! [`TrustLayer`](edgehub_auth::TrustLayer):
//!
//! - **Router**: maps method and path to a [`Route`](router::Route)
//! - **Extraction**: session token from the `token` cookie or a bearer header
//! - **Handlers**: session, role-gated admin, storage presign, and webhook routes
//! - **Service**: hyper `Service` with bounded raw-body capture
//! - **Response helpers**: JSON bodies and the session `Set-Cookie` values

pub mod body;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod router;
pub mod service;

pub use body::TrustResponseBody;
pub use error::HttpError;
pub use service::{TrustHttpConfig, TrustHttpService};
