//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the single JSON-RPC endpoint
//! - Wire up middleware (tracing, body limit, request ID, optional inbound auth)
//! - Route each call to its primary and relay the primary's response
//! - Replicate eligible engine calls to the secondaries

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::Response,
    routing::post,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::{ForwardingConfig, MultiplexerConfig};
use crate::http::middleware::inbound_auth_middleware;
use crate::http::multicast::spawn_secondaries;
use crate::http::request::{self, extract_method, forwardable_headers};
use crate::http::response;
use crate::http::upstream::Forwarder;
use crate::load_balancer::BackendRegistry;
use crate::observability::metrics;
use crate::routing::{Router as EngineRouter, RpcMethod};
use crate::security::{AuthError, JwtSecret};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EngineRouter>,
    pub forwarder: Forwarder,
    pub forwarding: Arc<ForwardingConfig>,
}

/// HTTP server for the multiplexer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over an already-built registry.
    pub fn new(config: &MultiplexerConfig, registry: Arc<BackendRegistry>) -> Result<Self, AuthError> {
        let state = AppState {
            router: Arc::new(EngineRouter::new(registry)),
            forwarder: Forwarder::new(Duration::from_millis(config.forwarding.timeout_ms)),
            forwarding: Arc::new(config.forwarding.clone()),
        };

        let inbound_secret = match (&config.auth.jwt_secret, config.auth.enforce) {
            (Some(raw), true) => Some(Arc::new(JwtSecret::from_hex(raw)?)),
            _ => None,
        };

        let router = Self::build_router(config, state, inbound_secret);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &MultiplexerConfig,
        state: AppState,
        inbound_secret: Option<Arc<JwtSecret>>,
    ) -> Router {
        let mut router = Router::new()
            .route("/", post(engine_handler))
            .with_state(state);

        if let Some(secret) = inbound_secret {
            tracing::info!("Inbound JWT authentication enforced");
            router = router.layer(middleware::from_fn_with_state(secret, inbound_auth_middleware));
        }

        // Outermost first: the request ID exists before tracing and limits run.
        router.layer(
            ServiceBuilder::new()
                .layer(request::set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(request::propagate_request_id_layer())
                .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
                .layer(DefaultBodyLimit::disable()),
        )
    }

    /// The router, for serving on a custom listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main JSON-RPC handler.
/// Parses the method, selects the primary, multicasts if eligible, then forwards.
async fn engine_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(&headers);

    // 1. Reject what cannot be routed
    let method = match extract_method(&body) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected malformed request");
            metrics::record_request("invalid", StatusCode::BAD_REQUEST.as_u16(), start_time);
            return response::bad_request(&e);
        }
    };

    // 2. Pick the primary from the current snapshot
    let Some(plan) = state.router.plan() else {
        tracing::warn!(request_id = %request_id, method = %method, "No execution engine available");
        metrics::record_no_backend();
        metrics::record_request(&method, StatusCode::INTERNAL_SERVER_ERROR.as_u16(), start_time);
        return response::no_backend();
    };

    // 3. Replicate eligible engine calls; secondaries never wait on the primary
    let outbound_headers = forwardable_headers(&headers);
    let rpc_method = RpcMethod::parse(&method);
    if rpc_method.should_multicast(&state.forwarding.excluded_calls) && !plan.secondaries.is_empty() {
        spawn_secondaries(
            &state.forwarder,
            &plan.secondaries,
            &outbound_headers,
            &body,
            &method,
            &request_id,
        );
        tracing::info!(
            request_id = %request_id,
            method = %method,
            targets = ?plan.secondary_names(),
            "Multicasted request"
        );
    }

    // 4. Forward to the primary
    let primary_result = state
        .forwarder
        .forward(&plan.primary, &outbound_headers, body)
        .await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        primary = %plan.primary.name,
        primary_state = plan.primary_state.as_str(),
        "Handled request by forwarding it to primary"
    );

    // 5. The caller only ever sees the primary's answer
    match primary_result {
        Ok(upstream) => {
            let status = upstream.status();
            metrics::record_forward(&plan.primary.name, "primary", "ok");
            metrics::record_request(&method, status.as_u16(), start_time);
            response::relay(upstream)
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                backend = %plan.primary.name,
                error = %e,
                "Primary forward failed"
            );
            metrics::record_forward(&plan.primary.name, "primary", "error");
            metrics::record_request(&method, response::forward_status(&e).as_u16(), start_time);
            response::upstream_error(&e)
        }
    }
}
