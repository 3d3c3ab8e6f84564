//! Book gateway library.
//!
//! A small HTTP API fronted by an ordered admission pipeline: route/method
//! validation with a health-check bypass, IP-aware fixed-window rate limiting,
//! CORS, security headers and conditional gzip compression.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod routing;

// Business endpoints
pub mod books;

// Cross-cutting concerns
pub mod compression;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
