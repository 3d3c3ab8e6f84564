//! Security response headers.
//!
//! # Responsibilities
//! - Compile the configured header set once at startup
//! - Stamp every response with it (CSP, HSTS, frame options, referrer policy, nosniff)
//!
//! # Design Decisions
//! - Values are static; nothing depends on the request
//! - Invalid header values are rejected at startup, not per request

use axum::{
    extract::{Request, State},
    http::{
        header::{self, HeaderName},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};

use crate::config::SecurityHeadersConfig;
use crate::http::server::AppState;

#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityHeadersConfig) -> Result<Self, String> {
        let mut headers = Vec::new();

        if let Some(csp) = config.content_security_policy.as_deref() {
            headers.push((header::CONTENT_SECURITY_POLICY, value(csp, "content_security_policy")?));
        }
        if config.hsts_enabled {
            headers.push((header::STRICT_TRANSPORT_SECURITY, value(&hsts(config), "hsts")?));
        }
        if !config.frame_options.is_empty() {
            headers.push((header::X_FRAME_OPTIONS, value(&config.frame_options, "frame_options")?));
        }
        if !config.referrer_policy.is_empty() {
            headers.push((header::REFERRER_POLICY, value(&config.referrer_policy, "referrer_policy")?));
        }
        if config.content_type_nosniff {
            headers.push((header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")));
        }

        Ok(Self { headers })
    }

    /// Insert every configured header, replacing existing values.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

fn hsts(config: &SecurityHeadersConfig) -> String {
    let mut policy = format!("max-age={}", config.hsts_max_age_secs);
    if config.hsts_include_subdomains {
        policy.push_str("; includeSubDomains");
    }
    if config.hsts_preload {
        policy.push_str("; preload");
    }
    policy
}

fn value(raw: &str, field: &str) -> Result<HeaderValue, String> {
    HeaderValue::from_str(raw).map_err(|e| format!("security_headers.{field}: {e}"))
}

pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    state.security_headers.apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let headers = SecurityHeaders::from_config(&SecurityHeadersConfig::default()).unwrap();
        let mut map = HeaderMap::new();
        headers.apply(&mut map);

        assert_eq!(map[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(map[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
        assert_eq!(map[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(!map.contains_key(header::STRICT_TRANSPORT_SECURITY));
        assert!(!map.contains_key(header::CONTENT_SECURITY_POLICY));
    }

    #[test]
    fn test_hsts_and_csp() {
        let config = SecurityHeadersConfig {
            hsts_enabled: true,
            content_security_policy: Some("default-src 'self'".into()),
            ..Default::default()
        };
        let mut map = HeaderMap::new();
        SecurityHeaders::from_config(&config).unwrap().apply(&mut map);

        assert_eq!(
            map[header::STRICT_TRANSPORT_SECURITY],
            "max-age=31556926; includeSubDomains; preload"
        );
        assert_eq!(map[header::CONTENT_SECURITY_POLICY], "default-src 'self'");
    }

    #[test]
    fn test_hsts_without_preload() {
        let config = SecurityHeadersConfig {
            hsts_enabled: true,
            hsts_preload: false,
            hsts_include_subdomains: false,
            hsts_max_age_secs: 600,
            ..Default::default()
        };
        assert_eq!(hsts(&config), "max-age=600");
    }

    #[test]
    fn test_invalid_value_rejected() {
        let config = SecurityHeadersConfig {
            frame_options: "DENY\r\n".into(),
            ..Default::default()
        };
        let err = SecurityHeaders::from_config(&config).unwrap_err();
        assert!(err.starts_with("security_headers.frame_options"));
    }
}
