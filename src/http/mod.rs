//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, connect info, graceful shutdown)
//!     → pipeline.rs (ordered admission layers)
//!     → request.rs (request ID, client address)
//!     → handler
//!     → response.rs (JSON envelope, passthrough marker, fallbacks)
//!     → Send to client
//! ```

pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use request::{client_address, MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{json_message, mark_passthrough, Message, Passthrough};
pub use server::{AppState, HttpServer};
