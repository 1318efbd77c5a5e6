//! Best-effort replication of engine calls to secondary backends.
//!
//! Each secondary forward runs as its own task. Its outcome is logged and
//! counted, and never reaches the caller.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::HeaderMap;
use tokio::task::JoinHandle;

use crate::http::upstream::Forwarder;
use crate::load_balancer::ExecutionBackend;
use crate::observability::metrics;

/// Spawn one detached forward per target. The handles are only for callers
/// that want to wait (tests, shutdown); dropping them does not cancel.
pub fn spawn_secondaries(
    forwarder: &Forwarder,
    targets: &[Arc<ExecutionBackend>],
    headers: &HeaderMap,
    body: &Bytes,
    method: &str,
    request_id: &str,
) -> Vec<JoinHandle<()>> {
    targets
        .iter()
        .map(|backend| {
            let forwarder = forwarder.clone();
            let backend = backend.clone();
            let headers = headers.clone();
            let body = body.clone();
            let method = method.to_string();
            let request_id = request_id.to_string();
            tokio::spawn(async move {
                match forwarder.forward(&backend, &headers, body).await {
                    Ok(resp) => {
                        tracing::debug!(
                            request_id = %request_id,
                            backend = %backend.name,
                            method = %method,
                            status = %resp.status(),
                            "Secondary forward completed"
                        );
                        metrics::record_forward(&backend.name, "secondary", "ok");
                    }
                    Err(e) => {
                        tracing::warn!(
                            request_id = %request_id,
                            backend = %backend.name,
                            method = %method,
                            error = %e,
                            "Secondary forward failed"
                        );
                        metrics::record_forward(&backend.name, "secondary", "error");
                    }
                }
            })
        })
        .collect()
}
