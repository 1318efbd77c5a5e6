//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming JSON-RPC request (method name)
//!     → router.rs: read every backend's snapshot once
//!         synced set, syncing set
//!         primary = best rank in synced, else in syncing, else none
//!         secondaries = (synced ∪ syncing) \ {primary}
//!     → method.rs: multicast only engine_* calls not in the excluded list
//! ```
//!
//! # Design Decisions
//! - Deterministic: same statuses always give the same primary
//! - The top-configured backend is computed once; a mismatch is only logged
//! - Routing never blocks on the health monitor; it reads published snapshots

pub mod method;
pub mod router;

pub use method::RpcMethod;
pub use router::{select_primary, ForwardPlan, Router};
