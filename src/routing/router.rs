//! Primary selection and multicast target computation.

use std::sync::Arc;

use crate::health::state::SyncState;
use crate::load_balancer::{BackendRegistry, ExecutionBackend, LoadBalancer, PriorityFirst};

/// Where one inbound request goes.
#[derive(Debug, Clone)]
pub struct ForwardPlan {
    /// Authoritative backend; its response is the caller's response.
    pub primary: Arc<ExecutionBackend>,
    /// State of the primary when the plan was made.
    pub primary_state: SyncState,
    /// Every other routable backend: synced first, then syncing, each in
    /// configuration order.
    pub secondaries: Vec<Arc<ExecutionBackend>>,
}

impl ForwardPlan {
    pub fn secondary_names(&self) -> Vec<&str> {
        self.secondaries.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Pick the primary: best rank among synced backends, else among syncing ones.
pub fn select_primary(
    balancer: &dyn LoadBalancer,
    synced: &[Arc<ExecutionBackend>],
    syncing: &[Arc<ExecutionBackend>],
) -> Option<(Arc<ExecutionBackend>, SyncState)> {
    if let Some(b) = balancer.next_server(synced) {
        return Some((b, SyncState::Synced));
    }
    balancer
        .next_server(syncing)
        .map(|b| (b, SyncState::Syncing))
}

/// Routes requests over the registry using the published backend statuses.
#[derive(Debug)]
pub struct Router {
    registry: Arc<BackendRegistry>,
    balancer: Box<dyn LoadBalancer>,
}

impl Router {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self::with_balancer(registry, Box::new(PriorityFirst::new()))
    }

    pub fn with_balancer(registry: Arc<BackendRegistry>, balancer: Box<dyn LoadBalancer>) -> Self {
        Self { registry, balancer }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Build a plan from a point-in-time read of every backend's state.
    /// `None` when no backend is synced or syncing.
    pub fn plan(&self) -> Option<ForwardPlan> {
        let mut synced = Vec::new();
        let mut syncing = Vec::new();
        for backend in self.registry.all_backends() {
            match backend.state() {
                SyncState::Synced => synced.push(backend.clone()),
                SyncState::Syncing => syncing.push(backend.clone()),
                SyncState::Unavailable => {}
            }
        }

        let (primary, primary_state) = select_primary(self.balancer.as_ref(), &synced, &syncing)?;

        let top = self.registry.top_priority();
        if !Arc::ptr_eq(top, &primary) {
            tracing::warn!(
                top = %top.name,
                primary = %primary.name,
                "Execution engine with top priority is unsynced or unavailable"
            );
        }

        let secondaries = synced
            .into_iter()
            .chain(syncing)
            .filter(|b| !Arc::ptr_eq(b, &primary))
            .collect();

        Some(ForwardPlan {
            primary,
            primary_state,
            secondaries,
        })
    }
}
