//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single execution client
//! - Hold its immutable identity (name, endpoint, secret, priority)
//! - Publish its sync status and block height as one atomic snapshot

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Uri;
use url::Url;

use crate::health::state::{SyncSnapshot, SyncState};
use crate::security::JwtSecret;

/// A single execution client.
#[derive(Debug)]
pub struct ExecutionBackend {
    /// Unique name, used as lookup key and in logs.
    pub name: String,
    /// JSON-RPC endpoint.
    pub url: Url,
    /// Same endpoint, pre-parsed for the HTTP client.
    pub uri: Uri,
    /// Shared secret for this backend's tokens only.
    pub secret: JwtSecret,
    /// Rank; lower value wins.
    pub priority: i64,

    /// Status and height, always replaced together.
    status: ArcSwap<SyncSnapshot>,
}

impl ExecutionBackend {
    /// Create a new backend in the `Unavailable` state.
    pub fn new(name: impl Into<String>, url: Url, secret: JwtSecret, priority: i64) -> Result<Self, axum::http::uri::InvalidUri> {
        let uri = url.as_str().parse()?;
        Ok(Self {
            name: name.into(),
            url,
            uri,
            secret,
            priority,
            status: ArcSwap::from_pointee(SyncSnapshot::unavailable()),
        })
    }

    /// Current status and height, read as one unit.
    pub fn snapshot(&self) -> SyncSnapshot {
        **self.status.load()
    }

    pub fn state(&self) -> SyncState {
        self.status.load().state
    }

    /// Replace status and height. Only the health monitor writes in production.
    pub fn publish(&self, snapshot: SyncSnapshot) {
        self.status.store(Arc::new(snapshot));
    }
}
