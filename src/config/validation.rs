//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (compression level, quotas, windows)
//! - Check that every CIDR range parses
//! - Check the rate-limit storage scheme
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::Method;
use ipnetwork::IpNetwork;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    if !config.routing.api_prefix.starts_with('/') {
        errors.push(ValidationError::new(
            "routing.api_prefix",
            "must start with '/'",
        ));
    }

    if config.compression.level > 9 {
        errors.push(ValidationError::new(
            "compression.level",
            format!("must be between 0 and 9, got {}", config.compression.level),
        ));
    }

    if config.rate_limit.requests_per_window == 0 {
        errors.push(ValidationError::new(
            "rate_limit.requests_per_window",
            "must be greater than 0",
        ));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.window_secs",
            "must be greater than 0",
        ));
    }

    let storage_url = config.storage_url();
    if !is_supported_storage(storage_url) {
        errors.push(ValidationError::new(
            "rate_limit.storage_url",
            format!("unsupported scheme (expected memory:// or redis://): {}", redact(storage_url)),
        ));
    }

    check_ranges(
        "rate_limit.exempt_ranges",
        &config.rate_limit.exempt_ranges,
        &mut errors,
    );
    check_ranges(
        "health_check.monitoring_ranges",
        &config.health_check.monitoring_ranges,
        &mut errors,
    );

    if config.health_check.method.parse::<Method>().is_err() {
        errors.push(ValidationError::new(
            "health_check.method",
            format!("not an HTTP method: {}", config.health_check.method),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub(crate) fn is_redis_url(url: &str) -> bool {
    url.starts_with("redis://") || url.starts_with("rediss://")
}

fn is_supported_storage(url: &str) -> bool {
    url.starts_with("memory://") || is_redis_url(url)
}

fn check_ranges(field: &str, ranges: &[String], errors: &mut Vec<ValidationError>) {
    for range in ranges {
        if let Err(e) = range.trim().parse::<IpNetwork>() {
            errors.push(ValidationError::new(
                field,
                format!("invalid CIDR range {range:?}: {e}"),
            ));
        }
    }
}

/// Strip credentials before a storage URL goes anywhere near a log line.
pub fn redact(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
