//! End-to-end routing and multicast tests.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use engine_multiplexer::http::response::NO_BACKEND_MESSAGE;
use engine_multiplexer::security::{jwt, JwtSecret};

mod common;
use common::{config_for, eventually, rpc, secret, spawn_multiplexer, Behavior, MockExecutionClient};

const SETTLE: Duration = Duration::from_secs(3);

fn served_by(body: &str) -> String {
    let v: Value = serde_json::from_str(body).unwrap();
    v["result"]["servedBy"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_caller_gets_primary_response() {
    let a = MockExecutionClient::start("a", Behavior::default()).await;
    let b = MockExecutionClient::start("b", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&a, 2), (&b, 1)])).await;

    let (status, body) = rpc(&mux.base, "engine_forkchoiceUpdatedV1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(served_by(&body), "b");
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["id"], json!(7));
}

#[tokio::test]
async fn test_synced_preferred_over_better_ranked_syncing() {
    let a = MockExecutionClient::start("a", Behavior { syncing_at: Some(50), ..Default::default() }).await;
    let b = MockExecutionClient::start("b", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&a, 1), (&b, 2)])).await;

    let (_, body) = rpc(&mux.base, "eth_chainId").await;
    assert_eq!(served_by(&body), "b");
}

#[tokio::test]
async fn test_equal_priority_ties_break_by_config_order() {
    let first = MockExecutionClient::start("first", Behavior::default()).await;
    let second = MockExecutionClient::start("second", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&first, 1), (&second, 1)])).await;

    for _ in 0..3 {
        let (_, body) = rpc(&mux.base, "eth_chainId").await;
        assert_eq!(served_by(&body), "first");
    }
}

#[tokio::test]
async fn test_engine_call_multicast_despite_slow_secondary() {
    let p = MockExecutionClient::start("p", Behavior::default()).await;
    let s1 = MockExecutionClient::start(
        "s1",
        Behavior { call_delay: Duration::from_secs(3), ..Default::default() },
    )
    .await;
    let s2 = MockExecutionClient::start("s2", Behavior { syncing_at: Some(10), ..Default::default() }).await;
    let s3 = MockExecutionClient::start("s3", Behavior { fail_probes: true, ..Default::default() }).await;
    let mux = spawn_multiplexer(&config_for(&[(&p, 1), (&s1, 2), (&s2, 3), (&s3, 4)])).await;

    let (status, body) = rpc(&mux.base, "engine_newPayloadV1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served_by(&body), "p");

    assert!(eventually(|| s1.calls_to("engine_newPayloadV1") == 1, SETTLE).await);
    assert!(eventually(|| s2.calls_to("engine_newPayloadV1") == 1, SETTLE).await);
    assert_eq!(p.calls_to("engine_newPayloadV1"), 1);
    assert!(s3.calls().is_empty());
}

#[tokio::test]
async fn test_excluded_and_non_engine_calls_are_not_multicast() {
    let p = MockExecutionClient::start("p", Behavior::default()).await;
    let s = MockExecutionClient::start("s", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&p, 1), (&s, 2)])).await;

    rpc(&mux.base, "engine_getPayloadV1").await;
    rpc(&mux.base, "eth_blockNumber").await;
    rpc(&mux.base, "web3_clientVersion").await;
    // A later multicast proves the earlier calls had the chance to arrive.
    rpc(&mux.base, "engine_forkchoiceUpdatedV1").await;

    assert!(eventually(|| s.calls_to("engine_forkchoiceUpdatedV1") == 1, SETTLE).await);
    assert_eq!(s.calls_to("engine_getPayloadV1"), 0);
    assert_eq!(s.calls_to("web3_clientVersion"), 0);
    assert_eq!(p.calls_to("engine_getPayloadV1"), 1);
    assert_eq!(p.calls_to("web3_clientVersion"), 1);
}

#[tokio::test]
async fn test_no_routable_backend_returns_500_without_forwarding() {
    let a = MockExecutionClient::start("a", Behavior { fail_probes: true, ..Default::default() }).await;
    let b = MockExecutionClient::start("b", Behavior { fail_probes: true, ..Default::default() }).await;
    let mux = spawn_multiplexer(&config_for(&[(&a, 1), (&b, 2)])).await;

    let (status, body) = rpc(&mux.base, "engine_newPayloadV1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, NO_BACKEND_MESSAGE);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(a.calls().is_empty());
    assert!(b.calls().is_empty());
}

#[tokio::test]
async fn test_routing_follows_refresh() {
    let a = MockExecutionClient::start("a", Behavior::default()).await;
    let b = MockExecutionClient::start("b", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&a, 1), (&b, 2)])).await;

    let (_, body) = rpc(&mux.base, "eth_chainId").await;
    assert_eq!(served_by(&body), "a");

    a.set_behavior(Behavior { fail_probes: true, ..Default::default() });
    mux.monitor.refresh().await;

    let (_, body) = rpc(&mux.base, "eth_chainId").await;
    assert_eq!(served_by(&body), "b");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let a = MockExecutionClient::start("a", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&a, 1)])).await;
    let client = reqwest::Client::new();

    let not_json = client.post(&mux.base).body("{oops").send().await.unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);

    let no_method = client
        .post(&mux.base)
        .json(&json!({"jsonrpc": "2.0", "id": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_method.status(), StatusCode::BAD_REQUEST);

    assert!(a.calls().is_empty());
}

#[tokio::test]
async fn test_each_backend_gets_its_own_token() {
    let p = MockExecutionClient::start("p", Behavior::default()).await;
    let s = MockExecutionClient::start("s", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&p, 1), (&s, 2)])).await;

    let client = reqwest::Client::new();
    client
        .post(&mux.base)
        .bearer_auth("caller-token-never-forwarded")
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "engine_forkchoiceUpdatedV2", "params": []}))
        .send()
        .await
        .unwrap();
    assert!(eventually(|| s.calls_to("engine_forkchoiceUpdatedV2") == 1, SETTLE).await);

    let p_secret = JwtSecret::from_hex(&secret(0)).unwrap();
    let s_secret = JwtSecret::from_hex(&secret(1)).unwrap();

    let p_token = p.calls()[0].bearer.clone().unwrap();
    let s_token = s.calls()[0].bearer.clone().unwrap();

    assert!(jwt::verify(&p_secret, &p_token).is_ok());
    assert!(jwt::verify(&s_secret, &p_token).is_err());
    assert!(jwt::verify(&s_secret, &s_token).is_ok());
    assert!(jwt::verify(&p_secret, &s_token).is_err());

    // The payload reaches every backend unchanged.
    assert_eq!(p.calls()[0].body, s.calls()[0].body);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let a = MockExecutionClient::start("a", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&a, 1)])).await;

    let resp = reqwest::Client::new()
        .post(&mux.base)
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId"}))
        .send()
        .await
        .unwrap();

    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_inbound_auth_enforced() {
    let a = MockExecutionClient::start("a", Behavior::default()).await;
    let mut config = config_for(&[(&a, 1)]);
    let inbound = secret(42);
    config.auth.jwt_secret = Some(inbound.clone());
    config.auth.enforce = true;
    let mux = spawn_multiplexer(&config).await;

    let (status, _) = rpc(&mux.base, "eth_chainId").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = jwt::issue(&JwtSecret::from_hex(&inbound).unwrap()).unwrap();
    let resp = reqwest::Client::new()
        .post(&mux.base)
        .bearer_auth(token)
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(a.calls().iter().all(|r| r.method == "eth_chainId"));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let a = MockExecutionClient::start("a", Behavior::default()).await;
    let mut config = config_for(&[(&a, 1)]);
    config.listener.max_body_bytes = 64;
    let mux = spawn_multiplexer(&config).await;

    let big = json!({"jsonrpc": "2.0", "id": 1, "method": "engine_newPayloadV1", "params": ["x".repeat(512)]});
    let resp = reqwest::Client::new().post(&mux.base).json(&big).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(a.calls().is_empty());
}

#[tokio::test]
async fn test_primary_stalling_mid_body_times_out() {
    let p = MockExecutionClient::start("p", Behavior { stall_body: true, ..Default::default() }).await;
    let mux = spawn_multiplexer(&config_for(&[(&p, 1)])).await;

    let started = std::time::Instant::now();
    let (status, body) = tokio::time::timeout(Duration::from_secs(5), rpc(&mux.base, "engine_newPayloadV1"))
        .await
        .expect("caller still waiting after the forward timeout");

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, "Upstream request timed out");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_secondaries_do_not_wait_for_slow_primary() {
    let p = MockExecutionClient::start(
        "p",
        Behavior { call_delay: Duration::from_millis(800), ..Default::default() },
    )
    .await;
    let s = MockExecutionClient::start("s", Behavior::default()).await;
    let mux = spawn_multiplexer(&config_for(&[(&p, 1), (&s, 2)])).await;

    let base = mux.base.clone();
    let caller = tokio::spawn(async move { rpc(&base, "engine_newPayloadV2").await });

    // The secondary has the call well before the primary answers.
    assert!(eventually(|| s.calls_to("engine_newPayloadV2") == 1, Duration::from_millis(500)).await);
    assert!(!caller.is_finished());

    let (status, body) = caller.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served_by(&body), "p");
}
