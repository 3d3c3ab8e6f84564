//! Gateway error taxonomy and its mapping to HTTP responses.
//!
//! Every variant that can reach a client renders as a fixed JSON envelope
//! (`{"message": ...}`). Internal detail only ever goes to the log.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::json_message;

pub const NOT_FOUND_MESSAGE: &str = "The requested resource could not be found.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "The requested method is not allowed for this resource.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error, please try again later.";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No registered route matches the request path.
    #[error("no route registered for path {path}")]
    NotFound { path: String },

    /// The route exists but does not accept the request method.
    #[error("method {method} not allowed for {pattern}")]
    MethodNotAllowed {
        method: Method,
        pattern: String,
        allowed: Vec<Method>,
    },

    /// The client address could not be parsed as an IP address.
    #[error("invalid client address: {0:?}")]
    InvalidAddress(String),

    /// The rate-limit counter store could not be reached.
    #[error("rate limit storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::InvalidAddress(_)
            | GatewayError::StorageUnavailable(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            GatewayError::NotFound { .. } => NOT_FOUND_MESSAGE,
            GatewayError::MethodNotAllowed { .. } => METHOD_NOT_ALLOWED_MESSAGE,
            _ => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = status.as_u16(), error = %self, "Request terminated with error");

        let mut response = json_message(status, self.public_message());
        if let GatewayError::MethodNotAllowed { allowed, .. } = &self {
            if allowed.is_empty() {
                return response;
            }
            if let Ok(value) = HeaderValue::from_str(&join_methods(allowed)) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

/// Comma-separated method list, as used by the `Allow` header.
pub fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
