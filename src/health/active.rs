//! Active health checking.
//!
//! # Responsibilities
//! - Probe every backend concurrently (`eth_syncing`, then `eth_blockNumber`)
//! - Classify each backend and apply the cross-backend lag correction
//! - Publish the results; a failing backend never affects another's result

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{self, MissedTickBehavior};

use crate::blockchain::{EngineRpcClient, RpcResult, SyncProgress};
use crate::config::HealthCheckConfig;
use crate::health::state::{apply_lag_correction, SyncSnapshot};
use crate::load_balancer::{BackendRegistry, ExecutionBackend};
use crate::observability::metrics;

pub struct HealthMonitor {
    backends: Arc<BackendRegistry>,
    config: HealthCheckConfig,
    client: EngineRpcClient,
    /// Held for the duration of a pass; passes never overlap.
    pass_guard: Mutex<()>,
}

impl HealthMonitor {
    pub fn new(backends: Arc<BackendRegistry>, config: HealthCheckConfig) -> Self {
        let client = EngineRpcClient::new(Duration::from_millis(config.probe_timeout_ms));
        Self {
            backends,
            config,
            client,
            pass_guard: Mutex::new(()),
        }
    }

    /// Refresh on a fixed cadence until shutdown. The first pass runs one
    /// interval from now; startup performs the initial refresh itself.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.config.interval_secs,
            lag_threshold = self.config.lag_threshold,
            backends = self.backends.len(),
            "Health monitor starting"
        );

        let period = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one refresh pass. Returns `false` if another pass was already in flight.
    pub async fn refresh(&self) -> bool {
        let Ok(_pass) = self.pass_guard.try_lock() else {
            tracing::debug!("Refresh already in progress, skipping");
            return false;
        };
        let started = Instant::now();

        let backends = self.backends.all_backends();
        let mut snapshots: Vec<SyncSnapshot> =
            join_all(backends.iter().map(|b| self.probe(b))).await;

        for i in apply_lag_correction(&mut snapshots, self.config.lag_threshold) {
            tracing::warn!(
                backend = %backends[i].name,
                block = snapshots[i].latest_block,
                threshold = self.config.lag_threshold,
                "Backend reports synced but trails its peers, treating as syncing"
            );
        }

        for (backend, snapshot) in backends.iter().zip(snapshots) {
            let previous = backend.snapshot();
            if previous.state != snapshot.state {
                tracing::info!(
                    backend = %backend.name,
                    from = previous.state.as_str(),
                    to = snapshot.state.as_str(),
                    "Backend status changed"
                );
            }
            backend.publish(snapshot);
            metrics::record_backend_status(&backend.name, snapshot);
        }

        metrics::record_refresh(started);
        tracing::info!(elapsed = ?started.elapsed(), "Refreshed execution client status");
        true
    }

    /// Probe one backend; failures are absorbed into `Unavailable`.
    async fn probe(&self, backend: &ExecutionBackend) -> SyncSnapshot {
        match self.classify(backend).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(backend = %backend.name, error = %e, "Error during status refresh");
                SyncSnapshot::unavailable()
            }
        }
    }

    async fn classify(&self, backend: &ExecutionBackend) -> RpcResult<SyncSnapshot> {
        match self.client.syncing(backend).await? {
            SyncProgress::NotSyncing => {
                let block = self.client.block_number(backend).await?;
                Ok(SyncSnapshot::synced(block))
            }
            SyncProgress::Syncing { current_block } => Ok(SyncSnapshot::syncing(current_block)),
        }
    }
}
