//! Route/method validation gate.
//!
//! Runs before rate limiting and before any handler. Requests that do not
//! map onto the registry are answered here and never reach business logic.

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::http::request::client_address;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::registry::RouteRegistry;
use crate::security::health_check::Probe;

/// Check a request path and method against the registry.
pub fn validate_route(
    registry: &RouteRegistry,
    path: &str,
    method: &Method,
) -> Result<(), GatewayError> {
    let entry = registry.resolve(path).ok_or_else(|| GatewayError::NotFound {
        path: path.to_string(),
    })?;

    if entry.allows(method) {
        return Ok(());
    }

    tracing::warn!(
        method = %method,
        path = %entry.pattern(),
        allowed = ?entry.methods(),
        "Method {} not allowed for path {}",
        method,
        entry.pattern()
    );
    Err(GatewayError::MethodNotAllowed {
        method: method.clone(),
        pattern: entry.pattern().to_string(),
        allowed: entry.methods().to_vec(),
    })
}

/// Middleware: health-check bypass wrapped around route validation.
pub async fn route_guard_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let method = request.method();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let client = client_address(&request, state.trust_forwarded_for);

    let probe = Probe {
        path,
        method,
        user_agent,
        client_addr: &client,
    };

    let verdict = state
        .health_check
        .guard(&probe, || validate_route(&state.registry, path, method));

    match verdict {
        None => {
            tracing::debug!(path = %path, client = %client, "Route validation skipped for health check");
            next.run(request).await
        }
        Some(Ok(())) => next.run(request).await,
        Some(Err(err)) => {
            metrics::record_rejection(match &err {
                GatewayError::NotFound { .. } => "not_found",
                _ => "method_not_allowed",
            });
            err.into_response()
        }
    }
}
