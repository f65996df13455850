//! Cryptographic trust layer for EdgeHub.
//!
//! Three components share one set of primitives and one failure discipline
//! (fail closed, constant-time comparison, explicit expiry):
//!
//! - **Sessions**: compact HS256 tokens issued and verified without server
//!   side state.
//! - **Presigned URLs**: AWS Signature Version 4 query-string signing for S3
//!   and Cloudflare R2.
//! - **Webhooks**: `t=<unix>,v1=<hex>` inbound verification with replay
//!   tolerance and plain HMAC outbound signing.
//!
//! # Usage
//!
//! ```rust
//! use edgehub_auth::TrustLayer;
//! use edgehub_auth::session::{Role, SessionClaims};
//! use edgehub_core::{Secret, TrustConfig};
//!
//! let config = TrustConfig::builder()
//!     .jwt_secret(Secret::new("dev-only"))
//!     .build();
//! let trust = TrustLayer::from_config(&config).unwrap();
//!
//! let token = trust.issue_session(SessionClaims::new("owner@local", Role::Owner));
//! assert!(trust.verify_session(Some(&token)).is_some());
//!
//! // Storage is not configured, so presigning reports it.
//! assert!(trust.presign_get("a.txt", 300).unwrap_err().is_configuration());
//! ```
//!
//! # Modules
//!
//! - [`crypto`] - SHA-256, HMAC-SHA256, base64url, hex, constant-time compare
//! - [`session`] - Session token issue and verification
//! - [`canonical`] - SigV4 canonical request construction
//! - [`sigv4`] - SigV4 string to sign and signing key derivation
//! - [`presign`] - Presigned URL issuance for S3 and R2
//! - [`webhook`] - Webhook signature codec
//! - [`error`] - Error and rejection types
//! - [`trust`] - The facade used by the HTTP layer

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod presign;
pub mod session;
pub mod sigv4;
pub mod trust;
pub mod webhook;

pub use error::{AuthError, SessionRejection, WebhookRejection};
pub use presign::{PresignMethod, PresignRequest, PresignedUrl, RequestPresigner};
pub use session::{Role, SessionAuthenticator, SessionClaims};
pub use trust::TrustLayer;
pub use webhook::WebhookCodec;
