// Main module for the Q-learning route planner
// Graph, reward shaping, training, greedy extraction and the planner facade

pub mod graph;
pub mod planner;
pub mod q_learning;
pub mod reward;
pub mod route;

// Re-export main components for easier access
pub use graph::WarehouseGraph;
pub use planner::RoutePlanner;
pub use q_learning::{QLearningTrainer, QTable};
pub use reward::{RewardMatrix, RewardShaping};
pub use route::{extract_route, Route};

use crate::config::RouterConfig;
use crate::error::RouterResult;

/// Initialize a planner from a loaded configuration
pub fn initialize_planner(config: &RouterConfig) -> RouterResult<RoutePlanner> {
    let planner = RoutePlanner::from_config(config)?;
    tracing::debug!(
        locations = planner.graph().len(),
        iterations = planner.config().iterations,
        "route planner initialized"
    );
    Ok(planner)
}

/// Source of routes between named locations
pub trait RouteSource {
    /// Route from `start` to `goal`
    fn route(&self, start: &str, goal: &str) -> RouterResult<Route>;

    /// Route from `start` to `goal` passing through `via`
    fn route_via(&self, start: &str, goal: &str, via: &str) -> RouterResult<Route>;
}

impl RouteSource for RoutePlanner {
    fn route(&self, start: &str, goal: &str) -> RouterResult<Route> {
        self.compute_route(start, goal)
    }

    fn route_via(&self, start: &str, goal: &str, via: &str) -> RouterResult<Route> {
        self.compute_route_via(start, goal, via)
    }
}
