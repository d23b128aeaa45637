// Reward matrix for the warehouse
// Per-hop rewards come from adjacency; goal states get an elevated self-transition reward

use crate::error::{RouterError, RouterResult};
use crate::reinforcement::graph::WarehouseGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reward constants used when shaping the matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardShaping {
    /// Reward for reaching a corridor neighbour
    pub hop_reward: f64,
    /// Self-transition reward injected at the goal (M)
    pub goal_reward: f64,
    /// Reward reduction per priority rank
    pub priority_step: f64,
}

impl Default for RewardShaping {
    fn default() -> Self {
        Self {
            hop_reward: 1.0,
            goal_reward: 1000.0,
            priority_step: 10.0,
        }
    }
}

/// N×N reward table, rebuilt for every route computation
#[derive(Debug, Clone, PartialEq)]
pub struct RewardMatrix {
    rewards: Vec<Vec<f64>>,
}

impl RewardMatrix {
    /// Build a reward matrix for `goal`, shaping priority locations by rank.
    ///
    /// Priority rewards are applied after the goal, so a priority entry that
    /// names the goal replaces the goal reward with its ranked value.
    pub fn build(
        graph: &WarehouseGraph,
        goal: &str,
        priorities: &[&str],
        shaping: &RewardShaping,
    ) -> RouterResult<Self> {
        let goal_state = graph.state_of(goal)?;

        let mut seen = HashSet::with_capacity(priorities.len());
        let mut priority_states = Vec::with_capacity(priorities.len());
        for location in priorities {
            let state = graph.state_of(location)?;
            if !seen.insert(state) {
                return Err(RouterError::invalid_argument(format!(
                    "priority location {} is listed more than once",
                    location
                )));
            }
            priority_states.push(state);
        }

        let mut matrix = Self::from_adjacency(graph, shaping.hop_reward);
        matrix.rewards[goal_state][goal_state] = shaping.goal_reward;

        for (rank, &state) in priority_states.iter().enumerate() {
            let reward = shaping.goal_reward - shaping.priority_step * rank as f64;
            if reward <= 0.0 {
                return Err(RouterError::invalid_argument(format!(
                    "priority rank {} of {} leaves no positive reward",
                    rank,
                    graph.location_of(state)
                )));
            }
            matrix.rewards[state][state] = reward;
        }

        Ok(matrix)
    }

    /// Single-goal reward matrix
    pub fn for_goal(
        graph: &WarehouseGraph,
        goal: &str,
        shaping: &RewardShaping,
    ) -> RouterResult<Self> {
        Self::build(graph, goal, &[], shaping)
    }

    /// Plain adjacency rewards without any goal, copied out of the template
    fn from_adjacency(graph: &WarehouseGraph, hop_reward: f64) -> Self {
        let rewards = graph
            .adjacency()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&adjacent| if adjacent { hop_reward } else { 0.0 })
                    .collect()
            })
            .collect();
        Self { rewards }
    }

    /// Wrap raw rows; every row must have one entry per state
    pub fn from_rows(rewards: Vec<Vec<f64>>) -> RouterResult<Self> {
        let n = rewards.len();
        if n == 0 {
            return Err(RouterError::invalid_argument("reward matrix has no states"));
        }
        if let Some(row) = rewards.iter().position(|row| row.len() != n) {
            return Err(RouterError::invalid_argument(format!(
                "reward row {} has {} entries, expected {}",
                row,
                rewards[row].len(),
                n
            )));
        }
        Ok(Self { rewards })
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.rewards[from][to]
    }

    /// States reachable from `state` with a positive reward
    pub fn playable_actions(&self, state: usize) -> Vec<usize> {
        self.rewards[state]
            .iter()
            .enumerate()
            .filter(|&(_, &reward)| reward > 0.0)
            .map(|(j, _)| j)
            .collect()
    }
}
