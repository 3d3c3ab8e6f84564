//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → health_check.rs (trusted monitoring traffic skips route validation)
//!     → limit_key.rs (client address → limiter key, exempt ranges → "unlimited")
//!     → rate_limit.rs (fixed-window quota per key)
//!     → handler
//! Outgoing response:
//!     → headers.rs (CSP, HSTS, frame options, referrer policy, nosniff)
//!     → cors.rs (API namespace only)
//! ```
//!
//! # Design Decisions
//! - IP range sets are parsed once at startup and shared read-only
//! - Limiter storage failures admit traffic (fail open) and are logged
//! - An unparseable client address is keyed verbatim rather than rejected

pub mod cors;
pub mod headers;
pub mod health_check;
pub mod ip_ranges;
pub mod limit_key;
pub mod rate_limit;

pub use cors::CorsPolicy;
pub use headers::SecurityHeaders;
pub use health_check::{HealthCheckBypass, Probe};
pub use ip_ranges::IpRangeSet;
pub use limit_key::{LimitKey, LimitKeyResolver};
pub use rate_limit::{CounterStore, Decision, MemoryStore, RateLimiter, RedisStore};
