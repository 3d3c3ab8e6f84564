//! CORS headers for the API namespace.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};

use crate::config::CorsConfig;
use crate::http::server::AppState;

const WILDCARD: &str = "*";

#[derive(Debug, Clone)]
enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

/// Cross-origin policy compiled from config, scoped to one path prefix.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    prefix: String,
    origins: AllowedOrigins,
    methods: HeaderValue,
    headers: HeaderValue,
    expose_headers: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig, api_prefix: &str) -> Result<Self, String> {
        let origins = if config.origins.iter().any(|o| o == WILDCARD) {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(
                config
                    .origins
                    .iter()
                    .map(|o| HeaderValue::from_str(o).map_err(|e| format!("cors.origins: {e}")))
                    .collect::<Result<_, _>>()?,
            )
        };

        Ok(Self {
            prefix: api_prefix.trim_end_matches('/').to_string(),
            origins,
            methods: joined(&config.methods, "cors.methods")?,
            headers: joined(&config.headers, "cors.headers")?,
            expose_headers: joined(&config.expose_headers, "cors.expose_headers")?,
        })
    }

    /// Whether `path` lies under the API namespace.
    pub fn covers(&self, path: &str) -> bool {
        path == self.prefix
            || path
                .strip_prefix(&self.prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Add CORS headers to a response for a request under the namespace.
    pub fn apply(&self, origin: Option<&HeaderValue>, method: &Method, target: &mut HeaderMap) {
        match &self.origins {
            AllowedOrigins::Any => {
                target.insert(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static(WILDCARD),
                );
            }
            AllowedOrigins::List(allowed) => {
                target.append(header::VARY, HeaderValue::from_static("Origin"));
                match origin {
                    Some(origin) if allowed.contains(origin) => {
                        target.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
                    }
                    _ => return,
                }
            }
        }

        target.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            self.expose_headers.clone(),
        );
        if *method == Method::OPTIONS {
            target.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
            target.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());
        }
    }
}

fn joined(values: &[String], field: &str) -> Result<HeaderValue, String> {
    HeaderValue::from_str(&values.join(", ")).map_err(|e| format!("{field}: {e}"))
}

pub async fn cors_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.cors.covers(request.uri().path()) {
        return next.run(request).await;
    }

    let origin = request.headers().get(header::ORIGIN).cloned();
    let method = request.method().clone();

    let mut response = next.run(request).await;
    state
        .cors
        .apply(origin.as_ref(), &method, response.headers_mut());
    response
}
