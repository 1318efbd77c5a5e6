use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::health::SyncState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routable_backends: usize,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub url: String,
    pub priority: i64,
    pub status: SyncState,
    pub latest_block: u64,
    pub top_priority: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let routable = state
        .registry
        .all_backends()
        .iter()
        .filter(|b| b.state().is_routable())
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if routable > 0 { "operational" } else { "no_backend" },
        routable_backends: routable,
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let top = state.registry.top_priority();
    let statuses = state
        .registry
        .all_backends()
        .iter()
        .map(|b| {
            let snapshot = b.snapshot();
            BackendStatus {
                name: b.name.clone(),
                url: b.url.to_string(),
                priority: b.priority,
                status: snapshot.state,
                latest_block: snapshot.latest_block,
                top_priority: Arc::ptr_eq(b, top),
            }
        })
        .collect();

    Json(statuses)
}
