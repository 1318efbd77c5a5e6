//! Inbound authentication middleware.
//! Verifies the consensus client's Engine API token when `auth.enforce` is set.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::security::{jwt, JwtSecret};

pub async fn inbound_auth_middleware(
    State(secret): State<Arc<JwtSecret>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        tracing::warn!("Inbound request without bearer token rejected");
        return Err(StatusCode::UNAUTHORIZED);
    };

    if let Err(e) = jwt::verify(&secret, token) {
        tracing::warn!(error = %e, "Inbound request with invalid token rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
