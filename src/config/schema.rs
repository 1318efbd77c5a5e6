//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the multiplexer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the engine multiplexer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MultiplexerConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Execution client definitions, in configuration order.
    pub backends: Vec<BackendConfig>,

    /// Health monitor settings.
    pub health_check: HealthCheckConfig,

    /// Forwarding and multicast settings.
    pub forwarding: ForwardingConfig,

    /// Inbound authentication settings.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl MultiplexerConfig {
    /// Backends that take part in monitoring and routing (priority > 0).
    pub fn active_backends(&self) -> impl Iterator<Item = &BackendConfig> {
        self.backends.iter().filter(|b| b.is_active())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8551").
    pub bind_address: String,

    /// Largest inbound JSON-RPC body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8551".to_string(),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Execution client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// JSON-RPC endpoint (e.g., "http://127.0.0.1:8551").
    pub url: String,

    /// Hex-encoded shared secret used to sign Engine API tokens.
    #[serde(alias = "jwtsecret")]
    pub jwt_secret: String,

    /// Rank for primary selection (lower = preferred, <= 0 disables the backend).
    #[serde(default = "default_priority")]
    pub priority: i64,
}

impl BackendConfig {
    pub fn is_active(&self) -> bool {
        self.priority > 0
    }
}

fn default_priority() -> i64 {
    1
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Interval between refresh passes in seconds.
    pub interval_secs: u64,

    /// Timeout for each `eth_syncing` / `eth_blockNumber` probe in milliseconds.
    pub probe_timeout_ms: u64,

    /// Blocks a synced backend may trail the best synced peer before it is
    /// downgraded to syncing.
    pub lag_threshold: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            probe_timeout_ms: 1000,
            lag_threshold: 10,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Timeout for each forwarded request (primary and secondaries) in milliseconds.
    pub timeout_ms: u64,

    /// `engine_*` calls that are answered by the primary only.
    pub excluded_calls: Vec<String>,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8000,
            excluded_calls: vec!["getPayloadV1".to_string()],
        }
    }
}

/// Inbound authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Hex-encoded secret the consensus client signs its tokens with.
    pub jwt_secret: Option<String>,

    /// Reject inbound requests without a valid token.
    pub enforce: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8552".to_string(),
        }
    }
}
