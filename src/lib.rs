// qroute - Warehouse route planning with tabular Q-learning
// Each request trains a fresh value table and walks it greedily

pub mod config;
pub mod error;
pub mod reinforcement;
pub mod route_log;

pub use config::{RouteLogConfig, RouterConfig, TopologyConfig, TrainingConfig};
pub use error::{RouterError, RouterResult};
pub use reinforcement::{Route, RoutePlanner, WarehouseGraph};
pub use route_log::RouteLog;

use anyhow::Result;
use tracing::info;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Initialize logging to stderr, filtered by `RUST_LOG` (default `info`)
///
/// @param ansi_colors - Whether to enable ANSI color codes in logs
pub fn init_with_logger(ansi_colors: bool) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt::Subscriber::builder()
        .with_ansi(ansi_colors)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(ansi_colors)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Initializing qroute v{}", version());
    Ok(())
}
