//! Engine API multiplexer library.
//!
//! One consensus client talks to several execution clients through this
//! crate: every call goes to the best-synced backend, and engine calls are
//! replicated to the others so they keep following the chain.

pub mod admin;
pub mod blockchain;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::MultiplexerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
