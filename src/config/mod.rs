// Configuration module for qroute
// Topology, training hyper-parameters and route log settings

#[allow(clippy::module_inception)]
pub mod config;

// Re-export main types for easier access
pub use config::{RouteLogConfig, RouterConfig, TopologyConfig, TrainingConfig};
