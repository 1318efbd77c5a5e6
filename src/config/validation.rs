//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that at least one backend is active and names are unique
//! - Validate URLs, shared secrets and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MultiplexerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system; any error is fatal

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::config::schema::MultiplexerConfig;
use crate::security::JwtSecret;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Parse a backend URL. Engine endpoints are plain http (local or private network).
pub fn parse_backend_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" => Ok(url),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

pub fn validate_config(config: &MultiplexerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.active_backends().next().is_none() {
        errors.push(ValidationError::new(
            "backends",
            "no backend with priority > 0 is configured",
        ));
    }

    let mut names = HashSet::new();
    for (i, backend) in config.backends.iter().enumerate() {
        let field = format!("backends[{}]", i);
        if backend.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !names.insert(backend.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate backend name '{}'", backend.name),
            ));
        }

        // Disabled backends are never contacted, so their endpoint details do not matter.
        if !backend.is_active() {
            continue;
        }

        if let Err(e) = parse_backend_url(&backend.url) {
            errors.push(ValidationError::new(
                format!("{}.url", field),
                format!("invalid url '{}': {}", backend.url, e),
            ));
        }
        if let Err(e) = JwtSecret::from_hex(&backend.jwt_secret) {
            errors.push(ValidationError::new(format!("{}.jwt_secret", field), e.to_string()));
        }
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be > 0"));
    }
    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::new("health_check.interval_secs", "must be > 0"));
    }
    if config.health_check.probe_timeout_ms == 0 {
        errors.push(ValidationError::new("health_check.probe_timeout_ms", "must be > 0"));
    }
    if config.forwarding.timeout_ms == 0 {
        errors.push(ValidationError::new("forwarding.timeout_ms", "must be > 0"));
    }

    if config.auth.enforce {
        match &config.auth.jwt_secret {
            None => errors.push(ValidationError::new(
                "auth.jwt_secret",
                "required when auth.enforce is set",
            )),
            Some(raw) => {
                if let Err(e) = JwtSecret::from_hex(raw) {
                    errors.push(ValidationError::new("auth.jwt_secret", e.to_string()));
                }
            }
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must be set when the admin API is enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
