//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the backend registry from the validated configuration
//! - Initialize metrics, then populate routing state with one refresh pass
//! - Start background tasks (health monitor, admin API)
//! - Bind the Engine API listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when statuses are known)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::MultiplexerConfig;
use crate::health::HealthMonitor;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendRegistry, RegistryError};
use crate::observability::metrics;
use crate::security::AuthError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("inbound auth: {0}")]
    Auth(#[from] AuthError),

    #[error("{field}: invalid socket address '{value}'")]
    Address { field: &'static str, value: String },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bring every subsystem up and serve the Engine API until shutdown.
pub async fn start(config: MultiplexerConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    // 1. Registry
    let registry = Arc::new(BackendRegistry::from_config(&config.backends)?);
    for backend in registry.all_backends() {
        tracing::info!(
            backend = %backend.name,
            url = %backend.url,
            priority = backend.priority,
            "Registered execution backend"
        );
    }

    // 2. Metrics
    if config.observability.metrics_enabled {
        let addr = parse_addr("observability.metrics_address", &config.observability.metrics_address)?;
        metrics::init_metrics(addr);
    }

    // 3. Routing state is known before the first request
    let monitor = Arc::new(HealthMonitor::new(registry.clone(), config.health_check.clone()));
    monitor.refresh().await;
    tokio::spawn(monitor.run(shutdown.subscribe()));

    // 4. Admin API
    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        let state = AdminState {
            registry: registry.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, rx).await {
                tracing::error!(error = %e, "Admin API stopped with an error");
            }
        });
    }

    // 5. Engine API listener
    let server = HttpServer::new(&config, registry)?;
    let listener = bind(&config.listener.bind_address).await?;
    server.run(listener, shutdown.subscribe()).await?;

    Ok(())
}

fn parse_addr(field: &'static str, value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::Address {
        field,
        value: value.to_string(),
    })
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}
