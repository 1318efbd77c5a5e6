//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, or JSON backend list)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (PORT, JWT, <NAME>_PRIORITY, SYNCING_DELAY_THRESHOLD)
//!     → validation.rs (semantic checks)
//!     → MultiplexerConfig (validated, immutable)
//!     → registry + subsystems built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend set never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, AuthConfig, BackendConfig, ForwardingConfig, HealthCheckConfig, ListenerConfig,
    MultiplexerConfig, ObservabilityConfig,
};
