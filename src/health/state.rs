//! Backend sync state model.
//!
//! # States
//! - Unavailable: probe failed; never routed to
//! - Syncing: reachable but catching up; fallback primary, still multicast to
//! - Synced: reachable and at chain head; preferred primary
//!
//! # State Transitions
//! ```text
//! any → any: decided by each refresh pass from the probe result
//! Synced → Syncing: lag correction, when h + threshold < max(synced h)
//! ```
//!
//! # Design Decisions
//! - No hysteresis: every pass re-evaluates from scratch
//! - Status and height form one value so readers never see a torn pair

use serde::Serialize;

/// Health state of an execution client.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Unavailable = 0,
    Syncing = 1,
    Synced = 2,
}

impl SyncState {
    pub fn is_routable(self) -> bool {
        self != SyncState::Unavailable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncState::Unavailable => "unavailable",
            SyncState::Syncing => "syncing",
            SyncState::Synced => "synced",
        }
    }
}

/// Status and block height observed in the same refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncSnapshot {
    pub state: SyncState,
    pub latest_block: u64,
}

impl SyncSnapshot {
    pub fn unavailable() -> Self {
        Self {
            state: SyncState::Unavailable,
            latest_block: 0,
        }
    }

    pub fn syncing(latest_block: u64) -> Self {
        Self {
            state: SyncState::Syncing,
            latest_block,
        }
    }

    pub fn synced(latest_block: u64) -> Self {
        Self {
            state: SyncState::Synced,
            latest_block,
        }
    }
}

impl Default for SyncSnapshot {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Downgrade synced entries that trail the highest synced entry by more than
/// `threshold` blocks. Returns the indices that were downgraded.
///
/// `eth_syncing` returning `false` while the node is behind may not happen
/// post-merge at all; this only guards against it.
pub fn apply_lag_correction(snapshots: &mut [SyncSnapshot], threshold: u64) -> Vec<usize> {
    let Some(max_block) = snapshots
        .iter()
        .filter(|s| s.state == SyncState::Synced)
        .map(|s| s.latest_block)
        .max()
    else {
        return Vec::new();
    };

    let mut downgraded = Vec::new();
    for (i, snapshot) in snapshots.iter_mut().enumerate() {
        if snapshot.state == SyncState::Synced
            && snapshot.latest_block.saturating_add(threshold) < max_block
        {
            snapshot.state = SyncState::Syncing;
            downgraded.push(i);
        }
    }
    downgraded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_correction_boundary() {
        let mut snaps = vec![
            SyncSnapshot::synced(100),
            SyncSnapshot::synced(90),  // 90 + 10 == 100, kept
            SyncSnapshot::synced(89),  // 89 + 10 < 100, downgraded
            SyncSnapshot::syncing(10), // not synced, untouched
            SyncSnapshot::unavailable(),
        ];
        let downgraded = apply_lag_correction(&mut snaps, 10);
        assert_eq!(downgraded, vec![2]);
        assert_eq!(snaps[0].state, SyncState::Synced);
        assert_eq!(snaps[1].state, SyncState::Synced);
        assert_eq!(snaps[2], SyncSnapshot::syncing(89));
        assert_eq!(snaps[3], SyncSnapshot::syncing(10));
        assert_eq!(snaps[4], SyncSnapshot::unavailable());
    }

    #[test]
    fn test_lag_correction_ignores_syncing_heights() {
        // A syncing node ahead of the synced one must not cause a downgrade.
        let mut snaps = vec![SyncSnapshot::synced(50), SyncSnapshot::syncing(500)];
        assert!(apply_lag_correction(&mut snaps, 0).is_empty());
        assert_eq!(snaps[0].state, SyncState::Synced);
    }

    #[test]
    fn test_lag_correction_no_synced() {
        let mut snaps = vec![SyncSnapshot::unavailable(), SyncSnapshot::syncing(3)];
        assert!(apply_lag_correction(&mut snaps, 10).is_empty());
    }

    #[test]
    fn test_lag_correction_zero_threshold() {
        let mut snaps = vec![SyncSnapshot::synced(5), SyncSnapshot::synced(4)];
        assert_eq!(apply_lag_correction(&mut snaps, 0), vec![1]);
    }

    #[test]
    fn test_state_helpers() {
        assert!(!SyncState::Unavailable.is_routable());
        assert!(SyncState::Syncing.is_routable());
        assert_eq!(SyncState::Synced.as_str(), "synced");
        assert_eq!(SyncSnapshot::default(), SyncSnapshot::unavailable());
    }
}
