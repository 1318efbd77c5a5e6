//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (and once at startup)
//!     → active.rs: probe every backend concurrently
//!         eth_syncing == false → eth_blockNumber → Synced(height)
//!         eth_syncing == {..}  → Syncing(currentBlock)
//!         any error/timeout    → Unavailable(0)
//!     → state.rs: lag correction across synced backends
//!     → publish one snapshot per backend
//! ```
//!
//! # Design Decisions
//! - Each probe is independent; the pass waits for all of them
//! - Results are corrected before they are published, so routing never sees
//!   an uncorrected Synced
//! - Health state is per-backend, written only by the monitor

pub mod active;
pub mod state;

pub use active::HealthMonitor;
pub use state::{SyncSnapshot, SyncState};
