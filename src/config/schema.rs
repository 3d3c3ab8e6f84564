//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment profile (development or production).
    pub profile: Profile,

    /// Listener configuration (bind address, client address source).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Routing namespace settings.
    pub routing: RoutingConfig,

    /// Response compression settings.
    pub compression: CompressionConfig,

    /// Cross-origin resource sharing settings.
    pub cors: CorsConfig,

    /// Security response header settings.
    pub security_headers: SecurityHeadersConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Health check bypass settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Development,
    Production,
}

impl Profile {
    /// Interpret the `PRODUCTION` flag; only `true` selects production.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") => Profile::Production,
            _ => Profile::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Profile::Production)
    }

    /// Log level used when none is configured.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Profile::Development => "debug",
            Profile::Production => "error",
        }
    }

    /// Rate-limit storage used when none is configured.
    pub fn default_storage_url(&self) -> &'static str {
        match self {
            Profile::Development => MEMORY_STORAGE_URL,
            Profile::Production => "redis://redis:6379/0",
        }
    }
}

pub const MEMORY_STORAGE_URL: &str = "memory://";

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Take the client address from the first `X-Forwarded-For` entry.
    /// Only enable behind a load balancer that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Namespace under which the API routes (and CORS) live.
    pub api_prefix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api".to_string(),
        }
    }
}

/// Response compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Enable the compression layer.
    pub enabled: bool,

    /// MIME types eligible for compression.
    pub mimetypes: Vec<String>,

    /// Gzip level, 0 (store) to 9 (best).
    pub level: u32,

    /// Minimum body size in bytes.
    pub min_size: usize,

    /// Request paths never compressed.
    pub exclude: Vec<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mimetypes: [
                "application/javascript",
                "application/json",
                "text/css",
                "text/html",
                "text/javascript",
                "text/xml",
            ]
            .map(String::from)
            .to_vec(),
            level: 6,
            min_size: 500,
            exclude: ["/static/", "/favicon.ico", "/api/large-data-no-compress"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// CORS configuration, applied to the API namespace only.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any.
    pub origins: Vec<String>,
    pub methods: Vec<String>,
    pub headers: Vec<String>,
    pub expose_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
            methods: ["GET", "POST", "PUT", "DELETE"].map(String::from).to_vec(),
            headers: ["Content-Type", "Authorization"].map(String::from).to_vec(),
            expose_headers: ["Content-Type", "Authorization"].map(String::from).to_vec(),
        }
    }
}

/// Security header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityHeadersConfig {
    /// Content-Security-Policy value; omitted when unset.
    pub content_security_policy: Option<String>,

    /// Send Strict-Transport-Security.
    pub hsts_enabled: bool,
    pub hsts_max_age_secs: u64,
    pub hsts_include_subdomains: bool,
    pub hsts_preload: bool,

    /// X-Frame-Options value.
    pub frame_options: String,

    /// Referrer-Policy value.
    pub referrer_policy: String,

    /// Send `X-Content-Type-Options: nosniff`.
    pub content_type_nosniff: bool,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            content_security_policy: None,
            hsts_enabled: false,
            hsts_max_age_secs: 31_556_926,
            hsts_include_subdomains: true,
            hsts_preload: true,
            frame_options: "DENY".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            content_type_nosniff: true,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Counter storage: `memory://` or `redis://...`.
    /// Unset means the profile default.
    pub storage_url: Option<String>,

    /// Requests allowed per key per window.
    pub requests_per_window: u64,

    /// Fixed window length in seconds.
    pub window_secs: u64,

    /// Client ranges exempt from limiting (CIDR).
    pub exempt_ranges: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage_url: None,
            requests_per_window: 10,
            window_secs: 60,
            exempt_ranges: default_google_ranges(),
        }
    }
}

/// Health check bypass configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Path probed by the monitoring system.
    pub path: String,

    /// Method used by the probe.
    pub method: String,

    /// User agent sent by the monitoring system.
    pub user_agent: String,

    /// Source ranges of the monitoring system (CIDR).
    pub monitoring_ranges: Vec<String>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            method: "GET".to_string(),
            user_agent: String::new(),
            monitoring_ranges: default_google_ranges(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). Unset means the profile default.
    pub log_level: Option<String>,

    /// Emit JSON log lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

fn default_google_ranges() -> Vec<String> {
    vec!["35.191.0.0/16".to_string(), "130.211.0.0/22".to_string()]
}

impl GatewayConfig {
    /// Storage URL after applying the profile default.
    pub fn storage_url(&self) -> &str {
        self.rate_limit
            .storage_url
            .as_deref()
            .unwrap_or_else(|| self.profile.default_storage_url())
    }

    /// Log level after applying the profile default.
    pub fn log_level(&self) -> &str {
        self.observability
            .log_level
            .as_deref()
            .unwrap_or_else(|| self.profile.default_log_level())
    }
}
