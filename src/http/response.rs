//! Response helpers shared by handlers and middleware.
//!
//! # Responsibilities
//! - Build the JSON message envelope used by every error and status reply
//! - Mark responses that must be sent through untouched (no body transform)
//! - Router fallbacks for traffic that skipped route validation

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::http::server::AppState;

/// The `{"message": ...}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn json_message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(Message::new(message))).into_response()
}

/// Response extension marking a streaming/passthrough body.
///
/// Compression never buffers or rewrites a response carrying this marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passthrough;

pub fn mark_passthrough(mut response: Response) -> Response {
    response.extensions_mut().insert(Passthrough);
    response
}

pub fn is_passthrough(response: &Response) -> bool {
    response.extensions().get::<Passthrough>().is_some()
}

/// Router fallback for paths with no route.
pub async fn fallback_not_found(uri: Uri) -> GatewayError {
    GatewayError::NotFound {
        path: uri.path().to_string(),
    }
}

/// Router fallback for a known path hit with an unrouted method.
pub async fn fallback_method_not_allowed(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> GatewayError {
    let (pattern, allowed) = match state.registry.resolve(uri.path()) {
        Some(entry) => (entry.pattern().to_string(), entry.methods().to_vec()),
        None => (uri.path().to_string(), Vec::new()),
    };
    GatewayError::MethodNotAllowed {
        method,
        pattern,
        allowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_message_body() {
        let response = json_message(StatusCode::OK, "Book deleted");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"message":"Book deleted"}"#);
    }

    #[test]
    fn test_passthrough_marker() {
        let response = json_message(StatusCode::OK, "x");
        assert!(!is_passthrough(&response));
        let response = mark_passthrough(response);
        assert!(is_passthrough(&response));
    }
}
