//! The request-admission pipeline.
//!
//! Layers, outermost first:
//!
//! ```text
//!  1. SetRequestId / PropagateRequestId   x-request-id (UUID v4)
//!  2. TraceLayer                          span per request
//!  3. track_metrics                       count + latency
//!  4. security_headers_middleware         CSP, HSTS, frame options, ...
//!  5. cors_middleware                     API namespace only
//!  6. CatchPanicLayer                     handler panic → 500 JSON
//!  7. DefaultBodyLimit                    max body size for extractors
//!  8. TimeoutLayer                        request deadline
//!  9. compression_middleware              gzip decision (after everything below)
//! 10. route_guard_middleware              health-check bypass → route validation
//! 11. rate_limit_middleware               fixed-window quota per client
//!     router → handler
//! ```
//!
//! Security headers and CORS sit outside the panic and timeout layers, so
//! every response carries them, including 500 and 408. Compression also sees
//! validator and limiter rejections.

use std::any::Any;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::compression::compression_middleware;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::{fallback_method_not_allowed, fallback_not_found};
use crate::http::server::AppState;
use crate::observability::metrics::track_metrics;
use crate::routing::route_guard_middleware;
use crate::security::cors::cors_middleware;
use crate::security::headers::security_headers_middleware;
use crate::security::rate_limit::rate_limit_middleware;

/// Wrap the route table in fallbacks and the full middleware stack.
#[allow(deprecated)]
pub fn apply(routes: Router<AppState>, state: &AppState, config: &GatewayConfig) -> Router<AppState> {
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = request_id(request).unwrap_or("-"),
            )
        }))
        .layer(from_fn(track_metrics))
        .layer(from_fn_with_state(state.clone(), security_headers_middleware))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(from_fn_with_state(state.clone(), compression_middleware))
        .layer(from_fn_with_state(state.clone(), route_guard_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware));

    routes
        .fallback(fallback_not_found)
        .method_not_allowed_fallback(fallback_method_not_allowed)
        .layer(layers)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    GatewayError::Internal(format!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_panic_response_hides_detail() {
        let response = panic_response(Box::new("secret database password"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Internal server error"));
        assert!(!body.contains("secret"));
    }
}
