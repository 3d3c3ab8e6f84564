//! Request-side helpers.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for requests that arrive without one
//! - Determine the client address used by health-check bypass and rate limiting
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - `X-Forwarded-For` is ignored unless explicitly trusted
//! - A missing peer address yields an empty string, never a panic

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderName, HeaderValue},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID assigned to this request, if any.
pub fn request_id<B>(request: &axum::http::Request<B>) -> Option<&str> {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
}

/// Textual client address for this request.
///
/// With `trust_forwarded_for`, the left-most `X-Forwarded-For` entry wins
/// (verbatim, possibly unparseable). Otherwise the socket peer IP.
pub fn client_address(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return addr.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(xff: Option<&'static str>, peer: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/books");
        if let Some(xff) = xff {
            builder = builder.header(X_FORWARDED_FOR, xff);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().unwrap();
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        request
    }

    #[test]
    fn test_peer_address() {
        let req = request(Some("35.191.0.1"), Some("203.0.113.5:40000"));
        assert_eq!(client_address(&req, false), "203.0.113.5");
    }

    #[test]
    fn test_trusted_forwarded_for() {
        let req = request(Some(" 35.191.0.1 , 10.0.0.1"), Some("10.0.0.1:40000"));
        assert_eq!(client_address(&req, true), "35.191.0.1");
    }

    #[test]
    fn test_forwarded_for_kept_verbatim() {
        let req = request(Some("unknown"), Some("10.0.0.1:40000"));
        assert_eq!(client_address(&req, true), "unknown");
    }

    #[test]
    fn test_trusted_but_absent_falls_back_to_peer() {
        let req = request(None, Some("[2001:db8::1]:443"));
        assert_eq!(client_address(&req, true), "2001:db8::1");
    }

    #[test]
    fn test_no_peer_is_empty() {
        assert_eq!(client_address(&request(None, None), false), "");
    }

    #[test]
    fn test_request_ids_are_unique_uuids() {
        let req = axum::http::Request::new(());
        let mut make = MakeRequestUuidV4;
        let a = make.make_request_id(&req).unwrap();
        let b = make.make_request_id(&req).unwrap();
        let a = a.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(a).is_ok());
        assert_ne!(a, b.header_value().to_str().unwrap());
    }
}
