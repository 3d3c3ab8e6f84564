//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     handlers added to RouteTable
//!     → registry.rs (record pattern + methods, add HEAD/OPTIONS)
//!     → Freeze as (axum Router, immutable RouteRegistry)
//!
//! Incoming Request (path, method)
//!     → matcher.rs (resolve concrete path to pattern)
//!     → validator.rs (NotFound / MethodNotAllowed / pass)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always resolves to the same pattern

pub mod matcher;
pub mod registry;
pub mod validator;

pub use registry::{RouteEntry, RouteRegistry, RouteTable};
pub use validator::{route_guard_middleware, validate_route};
