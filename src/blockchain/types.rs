//! JSON-RPC wire types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::security::AuthError;

/// Errors that can occur during an Engine RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Token could not be issued.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request could not be built.
    #[error("invalid request: {0}")]
    Build(String),

    /// Connection or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// No answer within the deadline.
    #[error("timeout after {0} ms")]
    Timeout(u64),

    /// Backend answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// Body was not a valid JSON-RPC response.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Backend returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response carried neither `result` nor `error`.
    #[error("response has no result")]
    MissingResult,
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: Value,
}

impl JsonRpcRequest {
    /// A request with no parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params: Value::Array(Vec::new()),
            id: Value::from(1),
        }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC 2.0 response with a typed result.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcErrorObject>,
}

impl<T> JsonRpcResponse<T> {
    pub fn into_result(self) -> RpcResult<T> {
        if let Some(err) = self.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or(RpcError::MissingResult)
    }
}
