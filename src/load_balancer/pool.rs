//! Backend registry.
//!
//! # Responsibilities
//! - Build the active backend set once from configuration
//! - Keep configuration order (it breaks priority ties)
//! - Remember the top-configured backend for diagnostics

use std::sync::Arc;

use thiserror::Error;

use crate::config::BackendConfig;
use crate::config::validation::parse_backend_url;
use crate::load_balancer::{backend::ExecutionBackend, LoadBalancer, PriorityFirst};
use crate::security::{AuthError, JwtSecret};

/// Errors raised while building the registry. All are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no active execution backend configured")]
    NoActiveBackends,

    #[error("backend '{name}': invalid secret: {source}")]
    Secret { name: String, source: AuthError },

    #[error("backend '{name}': invalid url: {reason}")]
    Url { name: String, reason: String },
}

/// The active execution clients, in configuration order.
#[derive(Debug)]
pub struct BackendRegistry {
    backends: Vec<Arc<ExecutionBackend>>,
    top_priority: Arc<ExecutionBackend>,
}

impl BackendRegistry {
    /// Build the registry from configuration, dropping backends with priority <= 0.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, RegistryError> {
        let mut backends = Vec::new();
        for config in configs.iter().filter(|c| c.is_active()) {
            let secret = JwtSecret::from_hex(&config.jwt_secret).map_err(|source| RegistryError::Secret {
                name: config.name.clone(),
                source,
            })?;
            let url = parse_backend_url(&config.url).map_err(|reason| RegistryError::Url {
                name: config.name.clone(),
                reason,
            })?;
            let backend = ExecutionBackend::new(config.name.clone(), url, secret, config.priority)
                .map_err(|e| RegistryError::Url {
                    name: config.name.clone(),
                    reason: e.to_string(),
                })?;
            backends.push(Arc::new(backend));
        }
        Self::new(backends)
    }

    /// Build the registry from ready-made descriptors.
    pub fn new(backends: Vec<Arc<ExecutionBackend>>) -> Result<Self, RegistryError> {
        let top_priority = PriorityFirst
            .next_server(&backends)
            .ok_or(RegistryError::NoActiveBackends)?;
        Ok(Self {
            backends,
            top_priority,
        })
    }

    pub fn all_backends(&self) -> &[Arc<ExecutionBackend>] {
        &self.backends
    }

    /// Highest-precedence backend by configuration, regardless of its status.
    pub fn top_priority(&self) -> &Arc<ExecutionBackend> {
        &self.top_priority
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ExecutionBackend>> {
        self.backends.iter().find(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
