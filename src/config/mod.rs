//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → .env + GATEWAY_* environment overrides
//!     → PRODUCTION profile + REDIS_PASSWORD secret
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into policy objects held by AppState
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A networked rate-limit store without a credential is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    CompressionConfig, CorsConfig, GatewayConfig, HealthCheckConfig, ListenerConfig,
    ObservabilityConfig, Profile, RateLimitConfig, SecurityHeadersConfig, MEMORY_STORAGE_URL,
};
pub use validation::ValidationError;
