//! Engine API multiplexer (v1)
//!
//! Sits between one consensus client and several execution clients.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                 ENGINE MULTIPLEXER                   │
//!                              │                                                      │
//!     Consensus client         │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing  │───▶│   upstream   │─────┼──▶ Primary EL
//!                              │  │ server  │    │  plan    │    │  forwarder   │     │
//!                              │  └─────────┘    └────┬─────┘    └──────────────┘     │
//!                              │                      │          ┌──────────────┐     │
//!                              │                      └─────────▶│  multicast   │─────┼──▶ Secondary ELs
//!                              │                                 └──────────────┘     │
//!                              │  ┌────────────────────────────────────────────────┐  │
//!                              │  │ health monitor → backend registry (snapshots)  │◀─┼─── eth_syncing /
//!                              │  └────────────────────────────────────────────────┘  │    eth_blockNumber
//!                              │  ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐  │
//!                              │  │ config  │ │ security │ │observa-  │ │lifecycle │  │
//!                              │  │         │ │   jwt    │ │ bility   │ │          │  │
//!                              │  └─────────┘ └──────────┘ └──────────┘ └──────────┘  │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use engine_multiplexer::config::load_config;
use engine_multiplexer::lifecycle::{signals, startup};
use engine_multiplexer::observability::logging::init_logging;
use engine_multiplexer::Shutdown;

#[derive(Parser)]
#[command(name = "engine-multiplexer")]
#[command(about = "Multiplex one consensus client over several execution clients", long_about = None)]
struct Args {
    /// Path to the configuration file (.toml, or .json backend list).
    #[arg(short, long, env = "MULTIPLEXER_CONFIG", default_value = "multiplexer.toml")]
    config: PathBuf,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args.log_level);

    tracing::info!("engine-multiplexer v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config).map_err(|e| {
        tracing::error!(path = %args.config.display(), error = %e, "Failed to load configuration");
        e
    })?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.active_backends().count(),
        interval_secs = config.health_check.interval_secs,
        lag_threshold = config.health_check.lag_threshold,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::watch(shutdown.clone()));

    startup::start(config, &shutdown).await.map_err(|e| {
        tracing::error!(error = %e, "Multiplexer terminated with an error");
        e
    })?;

    tracing::info!("Shutdown complete");
    Ok(())
}
