// Route planner
// Single entry point for direct, waypoint and priority-weighted routes.
// Every request trains its own value table; nothing is cached between calls.

use crate::config::{RouterConfig, TrainingConfig};
use crate::error::RouterResult;
use crate::reinforcement::{
    graph::WarehouseGraph,
    q_learning::QLearningTrainer,
    reward::RewardMatrix,
    route::{extract_route, Route},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Q-learning route planner over a fixed warehouse graph
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    graph: WarehouseGraph,
    config: TrainingConfig,
    trainer: QLearningTrainer,
}

impl RoutePlanner {
    /// Create a planner; the training configuration is validated up front
    pub fn new(graph: WarehouseGraph, config: TrainingConfig) -> RouterResult<Self> {
        config.validate()?;
        let trainer = QLearningTrainer::new(
            config.learning_rate,
            config.discount_factor,
            config.iterations,
        )
        .with_time_limit(config.time_limit());
        Ok(Self {
            graph,
            config,
            trainer,
        })
    }

    /// Planner over the reference warehouse with reference constants
    pub fn reference() -> Self {
        Self {
            graph: WarehouseGraph::reference(),
            config: TrainingConfig::default(),
            trainer: QLearningTrainer::default(),
        }
    }

    /// Build the graph and planner described by a full configuration
    pub fn from_config(config: &RouterConfig) -> RouterResult<Self> {
        let graph = config.topology.build_graph()?;
        Self::new(graph, config.training.clone())
    }

    pub fn graph(&self) -> &WarehouseGraph {
        &self.graph
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Greedy walks are cut off after this many moves
    pub fn max_route_steps(&self) -> usize {
        self.config.route_step_factor * self.graph.len()
    }

    /// Random source for one request: seeded when configured, fresh otherwise
    fn request_rng(&self) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    /// Compute a route from `start` to `goal`
    pub fn compute_route(&self, start: &str, goal: &str) -> RouterResult<Route> {
        let mut rng = self.request_rng();
        self.compute_route_with_rng(start, goal, &mut rng)
    }

    /// Compute a route from `start` to `goal` with an injected random source
    pub fn compute_route_with_rng<R: Rng>(
        &self,
        start: &str,
        goal: &str,
        rng: &mut R,
    ) -> RouterResult<Route> {
        let route = self.train_and_extract(start, goal, &[], rng)?;
        info!(start, goal, steps = route.step_count(), "route computed");
        Ok(route)
    }

    /// Compute a route from `start` to `goal` passing through `via`
    pub fn compute_route_via(&self, start: &str, goal: &str, via: &str) -> RouterResult<Route> {
        let mut rng = self.request_rng();
        self.compute_route_via_with_rng(start, goal, via, &mut rng)
    }

    /// Waypoint route with an injected random source.
    ///
    /// Both legs are trained independently; the composite is their
    /// concatenation, not an optimum over all paths through `via`.
    pub fn compute_route_via_with_rng<R: Rng>(
        &self,
        start: &str,
        goal: &str,
        via: &str,
        rng: &mut R,
    ) -> RouterResult<Route> {
        // Validate all three before spending any training time
        self.graph.state_of(start)?;
        self.graph.state_of(goal)?;
        self.graph.state_of(via)?;

        let first = self.train_and_extract(start, via, &[], rng)?;
        let second = self.train_and_extract(via, goal, &[], rng)?;
        let route = Route::compose(&first, &second)?;
        info!(
            start,
            goal,
            via,
            steps = route.step_count(),
            "waypoint route computed"
        );
        Ok(route)
    }

    /// Compute a route to `goal` with priority locations shaping the rewards
    pub fn compute_priority_route(
        &self,
        start: &str,
        goal: &str,
        priorities: &[&str],
    ) -> RouterResult<Route> {
        let mut rng = self.request_rng();
        self.compute_priority_route_with_rng(start, goal, priorities, &mut rng)
    }

    /// Priority route with an injected random source.
    ///
    /// `priorities[rank]` receives a self-transition reward of
    /// `goal_reward - priority_step * rank`.
    pub fn compute_priority_route_with_rng<R: Rng>(
        &self,
        start: &str,
        goal: &str,
        priorities: &[&str],
        rng: &mut R,
    ) -> RouterResult<Route> {
        let route = self.train_and_extract(start, goal, priorities, rng)?;
        info!(
            start,
            goal,
            priorities = priorities.len(),
            steps = route.step_count(),
            "priority route computed"
        );
        Ok(route)
    }

    /// One leg: reward matrix, fresh training run, bounded greedy walk.
    /// Retryable failures start over with a new value table.
    fn train_and_extract<R: Rng>(
        &self,
        start: &str,
        goal: &str,
        priorities: &[&str],
        rng: &mut R,
    ) -> RouterResult<Route> {
        self.graph.state_of(start)?;
        let rewards = RewardMatrix::build(&self.graph, goal, priorities, &self.config.shaping())?;

        if start == goal {
            debug!(start, "start equals goal, skipping training");
            return Ok(Route::single(start));
        }

        let max_steps = self.max_route_steps();
        let mut attempt = 1;
        loop {
            let outcome = self
                .trainer
                .train(&rewards, rng)
                .and_then(|q| extract_route(&q, &self.graph, start, goal, max_steps));

            match outcome {
                Ok(route) => return Ok(route),
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    warn!(
                        start,
                        goal,
                        attempt,
                        error = %err,
                        "training run failed, retrying with a fresh value table"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;
    use crate::reinforcement::graph::REFERENCE_LOCATIONS;

    fn seeded_planner(seed: u64, iterations: usize) -> RoutePlanner {
        RoutePlanner::new(
            WarehouseGraph::reference(),
            TrainingConfig {
                iterations,
                seed: Some(seed),
                ..TrainingConfig::default()
            },
        )
        .unwrap()
    }

    fn assert_valid(route: &Route, graph: &WarehouseGraph, start: &str, goal: &str) {
        assert_eq!(route.start(), start, "route {}", route);
        assert_eq!(route.goal(), goal, "route {}", route);
        assert!(
            route.is_connected_in(graph),
            "route {} skips a corridor",
            route
        );
    }

    #[test]
    fn test_start_equal_goal_returns_single_location() {
        let planner = seeded_planner(1, 1000);
        for location in REFERENCE_LOCATIONS {
            let route = planner.compute_route(location, location).unwrap();
            assert_eq!(route, Route::single(location));
        }
    }

    #[test]
    fn test_e_to_a_reference_scenario() {
        let planner = seeded_planner(2024, 5000);
        let route = planner.compute_route("E", "A").unwrap();
        assert_valid(&route, planner.graph(), "E", "A");
        // The only shortest path on the reference topology
        assert_eq!(route.locations(), ["E", "I", "J", "F", "B", "A"]);
    }

    #[test]
    fn test_all_pairs_produce_connected_routes() {
        let planner = seeded_planner(17, 5000);
        let graph = planner.graph();
        for start in REFERENCE_LOCATIONS {
            for goal in REFERENCE_LOCATIONS {
                if start == goal {
                    continue;
                }
                let route = planner.compute_route(start, goal).unwrap();
                assert_valid(&route, graph, start, goal);
                assert!(route.hops() <= planner.max_route_steps());
            }
        }
    }

    #[test]
    fn test_same_seed_same_route() {
        let planner = seeded_planner(99, 3000);
        let first = planner.compute_route("D", "E").unwrap();
        let second = planner.compute_route("D", "E").unwrap();
        assert_eq!(first, second);

        let other = seeded_planner(99, 3000);
        assert_eq!(other.compute_route("D", "E").unwrap(), first);
    }

    #[test]
    fn test_injected_rng_is_deterministic() {
        let planner = RoutePlanner::reference();
        let first = planner
            .compute_route_with_rng("K", "C", &mut ChaCha8Rng::seed_from_u64(5))
            .unwrap();
        let second = planner
            .compute_route_with_rng("K", "C", &mut ChaCha8Rng::seed_from_u64(5))
            .unwrap();
        assert_eq!(first, second);
        assert_valid(&first, planner.graph(), "K", "C");
    }

    #[test]
    fn test_via_route_is_two_valid_legs() {
        let planner = seeded_planner(8, 5000);
        let graph = planner.graph();
        let route = planner.compute_route_via("A", "L", "E").unwrap();
        assert_valid(&route, graph, "A", "L");

        let seam = route.locations().iter().position(|l| l == "E").unwrap();
        assert_eq!(route.locations().iter().filter(|l| *l == "E").count(), 1);

        let first = Route::new(route.locations()[..=seam].to_vec()).unwrap();
        let second = Route::new(route.locations()[seam..].to_vec()).unwrap();
        assert_valid(&first, graph, "A", "E");
        assert_valid(&second, graph, "E", "L");
    }

    #[test]
    fn test_via_route_matches_independent_legs() {
        let planner = seeded_planner(31, 3000);
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let first = planner.compute_route_with_rng("C", "I", &mut rng).unwrap();
        let second = planner.compute_route_with_rng("I", "D", &mut rng).unwrap();

        let composite = planner
            .compute_route_via_with_rng("C", "D", "I", &mut ChaCha8Rng::seed_from_u64(31))
            .unwrap();
        assert_eq!(composite, Route::compose(&first, &second).unwrap());
    }

    #[test]
    fn test_via_equal_to_endpoint_collapses() {
        let planner = seeded_planner(4, 3000);
        let route = planner.compute_route_via("E", "A", "E").unwrap();
        assert_valid(&route, planner.graph(), "E", "A");
        assert_eq!(route.locations().iter().filter(|l| *l == "E").count(), 1);
    }

    #[test]
    fn test_priority_route_reaches_goal() {
        let planner = seeded_planner(12, 5000);
        let route = planner
            .compute_priority_route("E", "A", &["A", "D"])
            .unwrap();
        assert_valid(&route, planner.graph(), "E", "A");
    }

    #[test]
    fn test_priority_next_to_path_traps_greedy_walk() {
        // C and G lie on one of the two shortest arms towards L and hold the walk
        let planner = RoutePlanner::reference();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = planner
            .compute_priority_route_with_rng("A", "L", &["C", "G"], &mut rng)
            .unwrap_err();
        match err {
            RouterError::RouteExtractionDivergence { max_steps, .. } => {
                assert_eq!(max_steps, planner.max_route_steps())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_locations_are_rejected() {
        let planner = RoutePlanner::reference();
        for result in [
            planner.compute_route("Z", "A"),
            planner.compute_route("A", "Z"),
            planner.compute_route_via("A", "B", "Z"),
            planner.compute_priority_route("A", "B", &["Q"]),
        ] {
            assert!(matches!(result, Err(RouterError::UnknownLocation { .. })));
        }
    }

    #[test]
    fn test_isolated_location_fails_training() {
        let graph = WarehouseGraph::new(&["A", "B", "C"], &[("A", "B")]).unwrap();
        let planner = RoutePlanner::new(
            graph,
            TrainingConfig {
                seed: Some(3),
                ..TrainingConfig::default()
            },
        )
        .unwrap();
        assert!(matches!(
            planner.compute_route("A", "B"),
            Err(RouterError::NoPlayableAction { state: 2 })
        ));
    }

    #[test]
    fn test_timeout_surfaces_after_retries() {
        let planner = RoutePlanner::new(
            WarehouseGraph::reference(),
            TrainingConfig {
                time_limit_ms: Some(0),
                seed: Some(1),
                ..TrainingConfig::default()
            },
        )
        .unwrap();
        assert!(matches!(
            planner.compute_route("E", "A"),
            Err(RouterError::TrainingTimeout { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = RoutePlanner::new(
            WarehouseGraph::reference(),
            TrainingConfig {
                discount_factor: 1.5,
                ..TrainingConfig::default()
            },
        );
        assert!(matches!(result, Err(RouterError::InvalidConfig { .. })));
    }

    #[test]
    fn test_from_config_uses_topology() {
        let mut config = RouterConfig::default();
        config.topology.locations = vec!["X".into(), "Y".into()];
        config.topology.edges = vec![("X".into(), "Y".into())];
        config.training.seed = Some(6);

        let planner = RoutePlanner::from_config(&config).unwrap();
        assert_eq!(planner.max_route_steps(), 4);
        let route = planner.compute_route("X", "Y").unwrap();
        assert_eq!(route.locations(), ["X", "Y"]);
    }
}
