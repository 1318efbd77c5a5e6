//! Authenticated Engine RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Send JSON-RPC 2.0 calls to one execution client with a fresh bearer token
//! - Bound every call (request, response headers and body) by one timeout
//! - Decode `eth_syncing` and `eth_blockNumber` results

use std::time::Duration;

use alloy::primitives::U64;
use alloy::rpc::types::eth::SyncStatus;
use axum::body::Body;
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use crate::blockchain::types::{JsonRpcRequest, JsonRpcResponse, RpcError, RpcResult};
use crate::load_balancer::ExecutionBackend;
use crate::security::jwt;

/// Probe responses are small; anything larger is treated as malformed.
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Sync progress as reported by `eth_syncing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncProgress {
    /// `eth_syncing` returned `false`.
    NotSyncing,
    /// Syncing, currently at this block.
    Syncing { current_block: u64 },
}

/// JSON-RPC client for the probes of the health monitor.
#[derive(Clone)]
pub struct EngineRpcClient {
    client: Client<HttpConnector, Body>,
    timeout_duration: Duration,
}

impl EngineRpcClient {
    pub fn new(timeout_duration: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            timeout_duration,
        }
    }

    /// Call `method` without parameters and decode its result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        backend: &ExecutionBackend,
        method: &str,
    ) -> RpcResult<T> {
        match timeout(self.timeout_duration, self.call_inner(backend, method)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout(self.timeout_duration.as_millis() as u64)),
        }
    }

    async fn call_inner<T: DeserializeOwned>(
        &self,
        backend: &ExecutionBackend,
        method: &str,
    ) -> RpcResult<T> {
        let token = jwt::issue(&backend.secret)?;
        let payload = serde_json::to_vec(&JsonRpcRequest::new(method))
            .map_err(|e| RpcError::Build(e.to_string()))?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(backend.uri.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, jwt::bearer(&token))
            .body(Body::from(payload))
            .map_err(|e| RpcError::Build(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::HttpStatus(status.as_u16()));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        let decoded: JsonRpcResponse<T> =
            serde_json::from_slice(&bytes).map_err(|e| RpcError::Decode(e.to_string()))?;
        decoded.into_result()
    }

    /// `eth_syncing`.
    pub async fn syncing(&self, backend: &ExecutionBackend) -> RpcResult<SyncProgress> {
        let status: SyncStatus = self.call(backend, "eth_syncing").await?;
        Ok(match status {
            SyncStatus::None => SyncProgress::NotSyncing,
            SyncStatus::Info(info) => SyncProgress::Syncing {
                current_block: u64::try_from(info.current_block)
                    .map_err(|e| RpcError::Decode(format!("currentBlock out of range: {}", e)))?,
            },
        })
    }

    /// `eth_blockNumber`.
    pub async fn block_number(&self, backend: &ExecutionBackend) -> RpcResult<u64> {
        let number: U64 = self.call(backend, "eth_blockNumber").await?;
        Ok(number.to::<u64>())
    }
}

impl std::fmt::Debug for EngineRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRpcClient")
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
