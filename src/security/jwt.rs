//! Engine API bearer tokens.
//!
//! Every outbound call carries a fresh HS256 token whose only claim is `iat`,
//! signed with the target backend's shared secret. Tokens are never cached.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of an Engine API shared secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Tokens whose `iat` differs from the local clock by more than this are rejected.
pub const IAT_WINDOW_SECS: u64 = 60;

/// Errors produced while handling shared secrets and tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("secret is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("secret must be {expected} bytes, got {0}", expected = SECRET_LEN)]
    InvalidLength(usize),

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Verification(String),
}

/// Claim set of an Engine API token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, Unix seconds.
    pub iat: u64,
}

/// A 32-byte shared secret. `Debug` never prints the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtSecret([u8; SECRET_LEN]);

impl JwtSecret {
    /// Decode a hex secret, with or without a `0x` prefix.
    pub fn from_hex(raw: &str) -> Result<Self, AuthError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(trimmed)?;
        let key: [u8; SECRET_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AuthError::InvalidLength(bytes.len()))?;
        Ok(Self(key))
    }

    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Issue a token for one outbound call, stamped with the current time.
pub fn issue(secret: &JwtSecret) -> Result<String, AuthError> {
    issue_at(secret, now_secs())
}

/// Issue a token with an explicit `iat`.
pub fn issue_at(secret: &JwtSecret, iat: u64) -> Result<String, AuthError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &Claims { iat },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Signing)
}

/// Check signature and `iat` freshness of a token.
pub fn verify(secret: &JwtSecret, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AuthError::Verification(e.to_string()))?;

    let now = now_secs();
    if data.claims.iat.abs_diff(now) > IAT_WINDOW_SECS {
        return Err(AuthError::Verification(format!(
            "iat {} outside of +/-{}s window",
            data.claims.iat, IAT_WINDOW_SECS
        )));
    }
    Ok(data.claims)
}

/// Value for an `Authorization` header.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
