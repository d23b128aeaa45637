// Route extraction from a trained value table
// Greedy walk bounded by a step budget, plus stitching of two legs at a waypoint

use crate::error::{RouterError, RouterResult};
use crate::reinforcement::graph::WarehouseGraph;
use crate::reinforcement::q_learning::QTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered sequence of locations from a start to a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Route {
    locations: Vec<String>,
}

impl Route {
    /// Build a route from an explicit, non-empty list of locations
    pub fn new(locations: Vec<String>) -> RouterResult<Self> {
        if locations.is_empty() {
            return Err(RouterError::invalid_argument("route must not be empty"));
        }
        Ok(Self { locations })
    }

    /// Degenerate route for start == goal
    pub fn single(location: impl Into<String>) -> Self {
        Self {
            locations: vec![location.into()],
        }
    }

    pub fn start(&self) -> &str {
        &self.locations[0]
    }

    pub fn goal(&self) -> &str {
        &self.locations[self.locations.len() - 1]
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Number of locations on the route, as recorded in the route log
    pub fn step_count(&self) -> usize {
        self.locations.len()
    }

    /// Number of corridors traversed
    pub fn hops(&self) -> usize {
        self.locations.len() - 1
    }

    pub fn contains(&self, location: &str) -> bool {
        self.locations.iter().any(|l| l == location)
    }

    /// Whether every consecutive pair shares a corridor in `graph`
    pub fn is_connected_in(&self, graph: &WarehouseGraph) -> bool {
        self.locations
            .windows(2)
            .all(|pair| graph.are_adjacent(&pair[0], &pair[1]))
    }

    /// Chain two legs that meet at a shared waypoint, keeping the seam once
    pub fn compose(first: &Route, second: &Route) -> RouterResult<Route> {
        if first.goal() != second.start() {
            return Err(RouterError::invalid_argument(format!(
                "cannot join a route ending at {} with one starting at {}",
                first.goal(),
                second.start()
            )));
        }
        let mut locations = first.locations.clone();
        locations.extend(second.locations.iter().skip(1).cloned());
        Ok(Route { locations })
    }
}

impl TryFrom<Vec<String>> for Route {
    type Error = RouterError;

    fn try_from(locations: Vec<String>) -> RouterResult<Self> {
        Route::new(locations)
    }
}

impl From<Route> for Vec<String> {
    fn from(route: Route) -> Self {
        route.locations
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.locations.join(" -> "))
    }
}

/// Walk the value table greedily from `start` until `goal` is reached.
///
/// Each move takes the highest-valued action of the current state, lowest
/// index on ties. A policy that cycles away from the goal is cut off after
/// `max_steps` moves with `RouteExtractionDivergence`.
pub fn extract_route(
    q: &QTable,
    graph: &WarehouseGraph,
    start: &str,
    goal: &str,
    max_steps: usize,
) -> RouterResult<Route> {
    let start_state = graph.state_of(start)?;
    let goal_state = graph.state_of(goal)?;
    if q.len() != graph.len() {
        return Err(RouterError::invalid_argument(format!(
            "value table covers {} states but the graph has {}",
            q.len(),
            graph.len()
        )));
    }

    let mut locations = vec![start.to_string()];
    let mut current = start_state;
    let mut steps = 0;
    while current != goal_state {
        if steps == max_steps {
            return Err(RouterError::divergence(start, goal, max_steps));
        }
        current = q.best_action(current);
        locations.push(graph.location_of(current).to_string());
        steps += 1;
    }

    Ok(Route { locations })
}
