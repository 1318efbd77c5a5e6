//! Request handling and transformation.
//!
//! # Responsibilities
//! - Attach and propagate a request ID (UUID v4) as early as possible
//! - Extract the JSON-RPC method name from the inbound body
//! - Prepare the header set forwarded to backends
//!
//! # Design Decisions
//! - The body itself is forwarded byte-for-byte; only the method is inspected
//! - Inbound `Authorization` is never forwarded; each backend gets its own token

use axum::http::{header, HeaderMap, HeaderName};
use serde_json::Value;
use thiserror::Error;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Inbound requests the multiplexer refuses before forwarding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InboundError {
    #[error("body is not valid JSON: {0}")]
    NotJson(String),

    #[error("body has no string `method` field")]
    MissingMethod,
}

/// Layer that assigns an `x-request-id` to requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Read the request ID set by `set_request_id_layer`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Extract the `method` of a single JSON-RPC request.
pub fn extract_method(body: &[u8]) -> Result<String, InboundError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| InboundError::NotJson(e.to_string()))?;
    value
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(InboundError::MissingMethod)
}

/// Headers that describe one hop and are not forwarded.
pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "host"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Inbound headers minus hop-by-hop, `Authorization` and `Content-Length`
/// (recomputed from the buffered body).
pub fn forwardable_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if is_hop_by_hop(name) || *name == header::AUTHORIZATION || *name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
