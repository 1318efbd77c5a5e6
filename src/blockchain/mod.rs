//! Execution client RPC subsystem.
//!
//! # Data Flow
//! ```text
//! Health monitor probe
//!     → client.rs (token from security::jwt, POST with timeout)
//!     → types.rs (JSON-RPC envelope, typed result or RpcError)
//! ```
//!
//! # Security Constraints
//! - Each call is signed with the target backend's own secret
//! - Never log secrets or tokens
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod types;

pub use client::{EngineRpcClient, SyncProgress};
pub use types::{JsonRpcRequest, RpcError, RpcResult};
