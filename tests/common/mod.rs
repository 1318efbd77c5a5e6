//! Shared utilities for integration testing.
//!
//! `MockExecutionClient` is a programmable execution client: it answers the
//! health probes from its current behaviour, echoes every other call with a
//! result naming itself, and records every request it receives.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use engine_multiplexer::config::{BackendConfig, MultiplexerConfig};
use engine_multiplexer::health::HealthMonitor;
use engine_multiplexer::http::HttpServer;
use engine_multiplexer::load_balancer::BackendRegistry;

/// One request as seen by a mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub body: Value,
    pub bearer: Option<String>,
}

/// What the mock reports and how it behaves.
#[derive(Debug, Clone)]
pub struct Behavior {
    /// `None`: `eth_syncing` returns `false`. `Some(h)`: syncing at `h`.
    pub syncing_at: Option<u64>,
    /// `eth_blockNumber` result.
    pub block: u64,
    /// Answer the probes with HTTP 500.
    pub fail_probes: bool,
    /// Delay before answering the probes.
    pub probe_delay: Duration,
    /// Delay before answering non-probe calls.
    pub call_delay: Duration,
    /// Answer non-probe calls with headers and a partial body, then never finish.
    pub stall_body: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            syncing_at: None,
            block: 100,
            fail_probes: false,
            probe_delay: Duration::ZERO,
            call_delay: Duration::ZERO,
            stall_body: false,
        }
    }
}

#[derive(Clone)]
struct MockState {
    name: String,
    behavior: Arc<Mutex<Behavior>>,
    log: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockExecutionClient {
    pub name: String,
    pub addr: SocketAddr,
    behavior: Arc<Mutex<Behavior>>,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl MockExecutionClient {
    /// Start a mock on an ephemeral port.
    pub async fn start(name: &str, behavior: Behavior) -> Self {
        let state = MockState {
            name: name.to_string(),
            behavior: Arc::new(Mutex::new(behavior)),
            log: Arc::new(Mutex::new(Vec::new())),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/", post(handle)).with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            name: name.to_string(),
            addr,
            behavior: state.behavior,
            log: state.log,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    /// Requests other than the health probes.
    pub fn calls(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| !is_probe(&r.method))
            .collect()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls().iter().filter(|r| r.method == method).count()
    }

    pub fn probes_of(&self, method: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

fn is_probe(method: &str) -> bool {
    method == "eth_syncing" || method == "eth_blockNumber"
}

async fn handle(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let method = body["method"].as_str().unwrap_or_default().to_string();
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    state.log.lock().unwrap().push(Recorded {
        method: method.clone(),
        body: body.clone(),
        bearer,
    });

    let behavior = state.behavior.lock().unwrap().clone();
    let id = body["id"].clone();

    if is_probe(&method) {
        if !behavior.probe_delay.is_zero() {
            tokio::time::sleep(behavior.probe_delay).await;
        }
        if behavior.fail_probes {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        let result = match (method.as_str(), behavior.syncing_at) {
            ("eth_syncing", None) => json!(false),
            ("eth_syncing", Some(h)) => json!({
                "startingBlock": "0x0",
                "currentBlock": format!("{:#x}", h),
                "highestBlock": format!("{:#x}", h + 1000),
            }),
            _ => json!(format!("{:#x}", behavior.block)),
        };
        return Json(json!({"jsonrpc": "2.0", "id": id, "result": result})).into_response();
    }

    if !behavior.call_delay.is_zero() {
        tokio::time::sleep(behavior.call_delay).await;
    }
    if behavior.stall_body {
        let head = stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(b"{\"jsonrpc\":"))]);
        return axum::http::Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from_stream(head.chain(stream::pending())))
            .unwrap();
    }
    Json(json!({"jsonrpc": "2.0", "id": id, "result": {"servedBy": state.name}})).into_response()
}

/// A distinct 32-byte hex secret per index.
pub fn secret(index: u8) -> String {
    hex::encode([index.wrapping_add(1); 32])
}

/// Config with one backend per mock, priorities as given, secrets from `secret(i)`.
pub fn config_for(mocks: &[(&MockExecutionClient, i64)]) -> MultiplexerConfig {
    let mut config = MultiplexerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.health_check.probe_timeout_ms = 500;
    config.forwarding.timeout_ms = 1000;
    config.backends = mocks
        .iter()
        .enumerate()
        .map(|(i, (mock, priority))| BackendConfig {
            name: mock.name.clone(),
            url: mock.url(),
            jwt_secret: secret(i as u8),
            priority: *priority,
        })
        .collect();
    config
}

/// POST a JSON-RPC call and return status and body.
pub async fn rpc(base: &str, method: &str) -> (reqwest::StatusCode, String) {
    let resp = reqwest::Client::new()
        .post(base)
        .json(&json!({"jsonrpc": "2.0", "id": 7, "method": method, "params": []}))
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.text().await.unwrap())
}

/// Poll until `check` holds or the deadline passes.
pub async fn eventually<F: Fn() -> bool>(check: F, deadline: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// A running multiplexer wired to its registry and monitor.
pub struct Multiplexer {
    pub base: String,
    pub registry: Arc<BackendRegistry>,
    pub monitor: Arc<HealthMonitor>,
}

/// Build registry and monitor, run one refresh, then serve on an ephemeral port.
pub async fn spawn_multiplexer(config: &MultiplexerConfig) -> Multiplexer {
    let registry = Arc::new(BackendRegistry::from_config(&config.backends).unwrap());
    let monitor = Arc::new(HealthMonitor::new(registry.clone(), config.health_check.clone()));
    assert!(monitor.refresh().await);

    let server = HttpServer::new(config, registry.clone()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server.router();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Multiplexer {
        base: format!("http://{}/", addr),
        registry,
        monitor,
    }
}
