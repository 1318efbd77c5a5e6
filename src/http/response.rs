//! Response handling.
//!
//! # Responsibilities
//! - Relay the primary's response (status, end-to-end headers, body) unchanged
//! - Map multiplexer-side failures to HTTP status codes

use axum::body::{Body, Bytes};
use axum::http::{Response as HttpResponse, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::{is_hop_by_hop, InboundError};
use crate::http::upstream::ForwardError;

pub const NO_BACKEND_MESSAGE: &str = "No execution engine available";

/// Send the primary's buffered response back to the caller. Framing headers
/// of the upstream hop are dropped; the body is re-framed by length.
pub fn relay(response: HttpResponse<Bytes>) -> Response {
    let (mut parts, body) = response.into_parts();
    let hop: Vec<_> = parts.headers.keys().filter(|n| is_hop_by_hop(n)).cloned().collect();
    for name in hop {
        parts.headers.remove(name);
    }
    Response::from_parts(parts, Body::from(body))
}

pub fn no_backend() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, NO_BACKEND_MESSAGE).into_response()
}

pub fn bad_request(err: &InboundError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        format!("Invalid JSON-RPC request: {}", err),
    )
        .into_response()
}

/// Status returned when the primary could not be reached.
pub fn forward_status(err: &ForwardError) -> StatusCode {
    match err {
        ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ForwardError::Transport(_) => StatusCode::BAD_GATEWAY,
        ForwardError::Auth(_) | ForwardError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn upstream_error(err: &ForwardError) -> Response {
    let status = forward_status(err);
    let message = match err {
        ForwardError::Timeout(_) => "Upstream request timed out",
        _ => "Upstream request failed",
    };
    (status, message).into_response()
}
