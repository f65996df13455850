//! HTTP-facing errors.
//!
//! Messages are deliberately coarse. An authentication failure never says
//! whether the credential was missing, expired, or forged.

use http::StatusCode;

/// A request that ended in an error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    /// No route matches the path.
    #[error("not found")]
    NotFound,

    /// The path exists but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// A session or webhook signature failed verification.
    #[error("unauthorized")]
    Unauthorized,

    /// The session is valid but its role may not use the route.
    #[error("forbidden")]
    Forbidden,

    /// The request is well-authenticated but unusable.
    #[error("{0}")]
    BadRequest(String),

    /// The body exceeds the configured limit.
    #[error("request body too large")]
    PayloadTooLarge,

    /// A required server-side setting is missing.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// The body could not be read.
    #[error("failed to read request body")]
    Body,

    /// The response could not be built.
    #[error("internal error")]
    Internal,
}

impl HttpError {
    /// Status code sent for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Body => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotConfigured(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
