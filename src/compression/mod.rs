//! Response compression subsystem.
//!
//! # Data Flow
//! ```text
//! Completed response (after handler, CORS and security headers)
//!     → policy.rs (passthrough? excluded path? size? MIME type?)
//!     → X-Compression-Status: potential | excluded
//!     → gzip.rs (only if the client accepts gzip and the result is smaller)
//! ```
//!
//! # Design Decisions
//! - The decision is a pure function; the middleware owns all mutation
//! - A compressed body is never larger than the original
//! - Passthrough responses are never buffered

pub mod gzip;
pub mod middleware;
pub mod policy;

pub use middleware::{compression_middleware, X_COMPRESSION_STATUS};
pub use policy::{CompressionCandidate, CompressionPolicy};
