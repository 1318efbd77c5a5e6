//! Environment overrides.
//!
//! Applied after the file is parsed and before validation:
//! - `<NAME>_PRIORITY` overrides the priority of backend `name` (uppercased)
//! - `SYNCING_DELAY_THRESHOLD` overrides `health_check.lag_threshold`
//!   (`SYNCING_DELAY_TRESHOLD` is still honoured for older deployments)
//! - `PORT` replaces the port of `listener.bind_address`
//! - `JWT` sets `auth.jwt_secret`

use crate::config::schema::MultiplexerConfig;

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut MultiplexerConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply overrides using an arbitrary variable lookup.
pub fn apply_overrides<F>(config: &mut MultiplexerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for backend in config.backends.iter_mut() {
        let key = format!("{}_PRIORITY", backend.name.to_uppercase());
        if let Some(raw) = lookup(&key) {
            match raw.trim().parse::<i64>() {
                Ok(priority) => {
                    tracing::info!(backend = %backend.name, priority, "Priority overridden from environment");
                    backend.priority = priority;
                }
                Err(e) => {
                    tracing::warn!(backend = %backend.name, variable = %key, error = %e, "Could not parse priority override, keeping configured value");
                }
            }
        }
    }

    if let Some(raw) = lookup("SYNCING_DELAY_THRESHOLD").or_else(|| lookup("SYNCING_DELAY_TRESHOLD")) {
        match raw.trim().parse::<u64>() {
            Ok(threshold) => config.health_check.lag_threshold = threshold,
            Err(e) => tracing::warn!(error = %e, "Could not parse lag threshold override"),
        }
    }

    if let Some(raw) = lookup("PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) => config.listener.bind_address = with_port(&config.listener.bind_address, port),
            Err(e) => tracing::warn!(error = %e, "Could not parse PORT override"),
        }
    }

    if let Some(secret) = lookup("JWT") {
        config.auth.jwt_secret = Some(secret);
    }
}

fn with_port(bind_address: &str, port: u16) -> String {
    let host = match bind_address.rsplit_once(':') {
        Some((host, _)) if !host.is_empty() => host,
        _ => "0.0.0.0",
    };
    format!("{}:{}", host, port)
}
