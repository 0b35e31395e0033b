//! Error types.
//!
//! Two layers:
//!
//! - [`Error`] surfaces startup and infrastructure failures: binding a port,
//!   reading configuration, registering a route twice.
//! - [`ApiError`] is the HTTP-facing taxonomy. Every failure detected while
//!   handling a request is converted into one of these and rendered by a
//!   single responder, so nothing ever propagates to hyper unhandled.

use http::StatusCode;

use crate::response::{IntoResponse, Response};
use crate::store::StoreError;

/// Startup and infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("route `{method} {path}` is already registered")]
    DuplicateRoute { method: String, path: String },

    #[error("invalid route `{method} {path}`: {reason}")]
    InvalidRoute { method: String, path: String, reason: String },

    #[error("invalid method `{0}`")]
    InvalidMethod(String),
}

/// Request-scoped failures, each mapped to exactly one status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body could not be decoded. 400.
    #[error("{0}")]
    MalformedRequest(String),

    /// Missing, invalid or expired session. 401.
    #[error("{0}")]
    Unauthenticated(String),

    /// The store rejected the payload. 422.
    #[error("{0}")]
    ValidationFailed(String),

    /// A looked-up record does not exist. 404.
    #[error("{0}")]
    NotFound(String),

    /// Signing or store failure. 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_)  => StatusCode::UNAUTHORIZED,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_)         => StatusCode::NOT_FOUND,
            Self::Internal(_)         => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound    => Self::NotFound(e.to_string()),
            StoreError::Invalid(m)  => Self::ValidationFailed(m),
            StoreError::Internal(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Response::error(self.status(), &self.to_string())
    }
}
