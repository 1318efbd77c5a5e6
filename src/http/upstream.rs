//! Forwarding of inbound requests to execution clients.
//!
//! # Responsibilities
//! - Rebuild the inbound request for one backend with a token for that backend
//! - Bound the whole exchange (connect, response head and body) by the
//!   forwarding timeout, so a backend that stalls mid-body cannot hold a caller

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time::timeout;

use crate::load_balancer::ExecutionBackend;
use crate::security::{jwt, AuthError};

/// Largest backend response buffered; payloads with many blobs stay well below.
const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("invalid request: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeout after {0} ms")]
    Timeout(u64),
}

/// HTTP client shared by all forwards.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout_duration: Duration,
}

impl Forwarder {
    pub fn new(timeout_duration: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            timeout_duration,
        }
    }

    /// POST `body` to `backend` with `headers` and a fresh token, and read the
    /// full response.
    pub async fn forward(
        &self,
        backend: &ExecutionBackend,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response<Bytes>, ForwardError> {
        let token = jwt::issue(&backend.secret)?;
        let auth = HeaderValue::from_str(&jwt::bearer(&token))
            .map_err(|e| ForwardError::Build(e.to_string()))?;

        let mut builder = Request::builder().method(Method::POST).uri(backend.uri.clone());
        if let Some(outbound) = builder.headers_mut() {
            outbound.extend(headers.clone());
            outbound.insert(header::AUTHORIZATION, auth);
        }
        let request = builder
            .body(Body::from(body))
            .map_err(|e| ForwardError::Build(e.to_string()))?;

        match timeout(self.timeout_duration, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout(self.timeout_duration.as_millis() as u64)),
        }
    }

    async fn exchange(&self, request: Request<Body>) -> Result<Response<Bytes>, ForwardError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ForwardError::Transport(e.to_string()))?;
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, collect(body).await?))
    }
}

async fn collect(body: Incoming) -> Result<Bytes, ForwardError> {
    axum::body::to_bytes(Body::new(body), MAX_RESPONSE_BYTES)
        .await
        .map_err(|e| ForwardError::Transport(e.to_string()))
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
