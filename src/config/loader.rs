//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::env::apply_env_overrides;
use crate::config::schema::{BackendConfig, MultiplexerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration text. JSON may be either a full config object or a bare
/// array of backends.
pub fn parse_config(content: &str, json: bool) -> Result<MultiplexerConfig, ConfigError> {
    if !json {
        return Ok(toml::from_str(content)?);
    }
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        let backends: Vec<BackendConfig> = serde_json::from_value(value)?;
        Ok(MultiplexerConfig {
            backends,
            ..MultiplexerConfig::default()
        })
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

/// Load configuration from a TOML (or `.json`) file, apply environment
/// overrides and validate.
pub fn load_config(path: &Path) -> Result<MultiplexerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let mut config = parse_config(&content, json)?;

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
