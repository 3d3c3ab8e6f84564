//! Configuration loading from disk and the environment.
//!
//! Precedence, lowest first: schema defaults, TOML file, `.env`, process
//! environment. Environment overrides use the `GATEWAY_` prefix with flat
//! keys; list values are comma separated.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, Profile};
use crate::config::validation::{is_redis_url, validate_config, ValidationError};

pub const ENV_PREFIX: &str = "GATEWAY_";
pub const PRODUCTION_VAR: &str = "PRODUCTION";
pub const STORAGE_SECRET_VAR: &str = "REDIS_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("{0} environment variable is not set")]
    MissingSecret(&'static str),

    #[error("Invalid storage URL: {0}")]
    StorageUrl(String),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// A section validated but could not be compiled into its runtime policy.
    #[error("Invalid policy configuration: {0}")]
    Policy(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Flat environment overrides, read with the `GATEWAY_` prefix.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    bind_address: Option<String>,
    trust_forwarded_for: Option<bool>,
    request_timeout_secs: Option<u64>,

    compress_enabled: Option<bool>,
    compress_mimetypes: Option<Vec<String>>,
    compress_level: Option<u32>,
    compress_min_size: Option<usize>,
    compress_exclude: Option<Vec<String>>,

    cors_origins: Option<Vec<String>>,
    cors_methods: Option<Vec<String>>,
    cors_headers: Option<Vec<String>>,
    cors_expose_headers: Option<Vec<String>>,

    content_security_policy: Option<String>,
    hsts_enabled: Option<bool>,
    hsts_preload: Option<bool>,
    frame_options: Option<String>,
    referrer_policy: Option<String>,

    rate_limit_enabled: Option<bool>,
    storage_url: Option<String>,
    rate_limit_requests: Option<u64>,
    rate_limit_window_secs: Option<u64>,
    limiter_ip_ranges: Option<Vec<String>>,

    health_check_route: Option<String>,
    health_check_method: Option<String>,
    health_check_user_agent: Option<String>,
    ip_ranges: Option<Vec<String>>,

    log_level: Option<String>,
    json_logs: Option<bool>,
    metrics_enabled: Option<bool>,
}

macro_rules! override_with {
    ($($target:expr => $value:expr),* $(,)?) => {
        $(
            if let Some(value) = $value {
                $target = value;
            }
        )*
    };
}

impl EnvOverrides {
    fn apply(self, config: &mut GatewayConfig) {
        override_with! {
            config.listener.bind_address => self.bind_address,
            config.listener.trust_forwarded_for => self.trust_forwarded_for,
            config.timeouts.request_secs => self.request_timeout_secs,
            config.compression.enabled => self.compress_enabled,
            config.compression.mimetypes => self.compress_mimetypes,
            config.compression.level => self.compress_level,
            config.compression.min_size => self.compress_min_size,
            config.compression.exclude => self.compress_exclude,
            config.cors.origins => self.cors_origins,
            config.cors.methods => self.cors_methods,
            config.cors.headers => self.cors_headers,
            config.cors.expose_headers => self.cors_expose_headers,
            config.security_headers.hsts_enabled => self.hsts_enabled,
            config.security_headers.hsts_preload => self.hsts_preload,
            config.security_headers.frame_options => self.frame_options,
            config.security_headers.referrer_policy => self.referrer_policy,
            config.rate_limit.enabled => self.rate_limit_enabled,
            config.rate_limit.requests_per_window => self.rate_limit_requests,
            config.rate_limit.window_secs => self.rate_limit_window_secs,
            config.rate_limit.exempt_ranges => self.limiter_ip_ranges,
            config.health_check.path => self.health_check_route,
            config.health_check.method => self.health_check_method,
            config.health_check.user_agent => self.health_check_user_agent,
            config.health_check.monitoring_ranges => self.ip_ranges,
            config.observability.json_logs => self.json_logs,
            config.observability.metrics_enabled => self.metrics_enabled,
        }

        if self.content_security_policy.is_some() {
            config.security_headers.content_security_policy = self.content_security_policy;
        }
        if self.storage_url.is_some() {
            config.rate_limit.storage_url = self.storage_url;
        }
        if self.log_level.is_some() {
            config.observability.log_level = self.log_level;
        }
    }
}

/// Load, resolve and validate configuration.
///
/// Reads the optional TOML file, loads `.env` into the process environment
/// and applies environment overrides on top.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    if let Ok(env_file) = dotenvy::dotenv() {
        tracing::debug!(path = %env_file.display(), "Loaded .env file");
    }

    resolve_config(config, std::env::vars())
}

/// Apply environment variables to a parsed configuration and validate it.
pub fn resolve_config<I>(mut config: GatewayConfig, vars: I) -> Result<GatewayConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars.into_iter().collect();
    let lookup = |name: &str| {
        vars.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    if let Some(flag) = lookup(PRODUCTION_VAR) {
        config.profile = Profile::from_flag(Some(flag));
    }

    let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_iter(vars.iter().cloned())?;
    overrides.apply(&mut config);

    let storage_url = config.storage_url().to_string();
    let secret = lookup(STORAGE_SECRET_VAR).map(clean_secret);
    config.rate_limit.storage_url = Some(inject_storage_secret(&storage_url, secret)?);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Secrets sometimes arrive quoted from `.env` files.
fn clean_secret(raw: &str) -> &str {
    raw.trim().trim_matches('\'').trim()
}

/// Put the storage password into a networked storage URL.
///
/// A networked store always needs a credential: either already embedded in
/// the URL or supplied through `REDIS_PASSWORD`.
pub fn inject_storage_secret(storage_url: &str, secret: Option<&str>) -> Result<String, ConfigError> {
    if !is_redis_url(storage_url) {
        return Ok(storage_url.to_string());
    }

    let mut url = Url::parse(storage_url).map_err(|e| ConfigError::StorageUrl(e.to_string()))?;
    if url.password().is_some_and(|p| !p.is_empty()) {
        return Ok(url.to_string());
    }

    match secret {
        Some(secret) if !secret.is_empty() => {
            url.set_password(Some(secret))
                .map_err(|_| ConfigError::StorageUrl("URL cannot carry a password".to_string()))?;
            Ok(url.to_string())
        }
        _ => {
            tracing::error!("{} environment variable is not set", STORAGE_SECRET_VAR);
            Err(ConfigError::MissingSecret(STORAGE_SECRET_VAR))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_environment_keeps_defaults() {
        let config = resolve_config(GatewayConfig::default(), Vec::new()).unwrap();
        assert_eq!(config.storage_url(), "memory://");
        assert_eq!(config.compression.level, 6);
    }

    #[test]
    fn test_prefixed_overrides() {
        let config = resolve_config(
            GatewayConfig::default(),
            vars(&[
                ("GATEWAY_COMPRESS_LEVEL", "9"),
                ("GATEWAY_COMPRESS_EXCLUDE", "/a,/b"),
                ("GATEWAY_CORS_ORIGINS", "https://example.com"),
                ("GATEWAY_RATE_LIMIT_REQUESTS", "3"),
                ("UNRELATED", "ignored"),
            ]),
        )
        .unwrap();
        assert_eq!(config.compression.level, 9);
        assert_eq!(config.compression.exclude, vec!["/a", "/b"]);
        assert_eq!(config.cors.origins, vec!["https://example.com"]);
        assert_eq!(config.rate_limit.requests_per_window, 3);
    }

    #[test]
    fn test_production_requires_storage_secret() {
        let err = resolve_config(GatewayConfig::default(), vars(&[("PRODUCTION", "true")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret("REDIS_PASSWORD")));
    }

    #[test]
    fn test_production_injects_storage_secret() {
        let config = resolve_config(
            GatewayConfig::default(),
            vars(&[("PRODUCTION", "true"), ("REDIS_PASSWORD", "'s3cret' ")]),
        )
        .unwrap();
        assert!(config.profile.is_production());
        assert_eq!(config.storage_url(), "redis://:s3cret@redis:6379/0");
        assert_eq!(config.log_level(), "error");
    }

    #[test]
    fn test_embedded_password_is_kept() {
        let url = inject_storage_secret("redis://:inline@cache:6379/1", None).unwrap();
        assert_eq!(url, "redis://:inline@cache:6379/1");
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let err = resolve_config(
            GatewayConfig::default(),
            vars(&[("GATEWAY_COMPRESS_LEVEL", "11")]),
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors[0].field, "compression.level"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
