//! Backend registry and selection subsystem.
//!
//! # Data Flow
//! ```text
//! Validated config
//!     → pool.rs (build registry of active backends, priority > 0)
//!     → backend.rs (one descriptor per execution client)
//!
//! Per request:
//!     → routing layer partitions backends by sync state
//!     → priority.rs picks the lowest rank within a tier
//! ```
//!
//! # Design Decisions
//! - The backend set is fixed after startup
//! - Selection is stateless and deterministic (no rotation, no randomness)
//! - Status lives on each backend behind an atomic snapshot

use std::sync::Arc;

pub mod backend;
pub mod pool;
pub mod priority;

pub use backend::ExecutionBackend;
pub use pool::{BackendRegistry, RegistryError};
pub use priority::PriorityFirst;

/// Strategy for choosing one backend out of a candidate slice.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    fn next_server(&self, backends: &[Arc<ExecutionBackend>]) -> Option<Arc<ExecutionBackend>>;
}
