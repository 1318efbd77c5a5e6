//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Consensus client POST /
//!     → server.rs (Axum setup, body limit, request ID, optional auth)
//!     → request.rs (extract JSON-RPC method, prepare headers)
//!     → routing layer decides primary + secondaries
//!     → multicast.rs (detached forwards to secondaries, engine_* only)
//!     → upstream.rs (forward to primary with its own token, whole exchange bounded)
//!     → response.rs (relay primary response)
//!     → Send to caller
//! ```

pub mod middleware;
pub mod multicast;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use upstream::{ForwardError, Forwarder};
