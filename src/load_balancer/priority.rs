//! Priority-rank selection strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::ExecutionBackend, LoadBalancer};

/// Selects the backend with the lowest priority value.
/// Ties go to the backend listed first, so the choice is deterministic.
#[derive(Debug, Default)]
pub struct PriorityFirst;

impl PriorityFirst {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for PriorityFirst {
    fn next_server(&self, backends: &[Arc<ExecutionBackend>]) -> Option<Arc<ExecutionBackend>> {
        // min_by_key returns the first of several equal minima
        backends.iter().min_by_key(|b| b.priority).cloned()
    }
}
