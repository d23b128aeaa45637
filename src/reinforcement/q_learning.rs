// Q-Learning implementation for warehouse routing
// Trains a dense state × state value table against a reward matrix

use crate::error::{RouterError, RouterResult};
use crate::reinforcement::reward::RewardMatrix;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::debug;

/// Learned value table, owned by a single training run
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Vec<Vec<f64>>,
}

impl QTable {
    /// All-zero table for `states` states
    pub fn zeros(states: usize) -> Self {
        Self {
            values: vec![vec![0.0; states]; states],
        }
    }

    /// Wrap raw rows; the table must be square
    pub fn from_rows(values: Vec<Vec<f64>>) -> RouterResult<Self> {
        let n = values.len();
        if n == 0 || values.iter().any(|row| row.len() != n) {
            return Err(RouterError::invalid_argument(
                "value table must be square and non-empty",
            ));
        }
        Ok(Self { values })
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the Q-value for a state-action pair
    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[state][action]
    }

    /// Get the maximum Q-value for a state
    pub fn max_value(&self, state: usize) -> f64 {
        self.values[state]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Get the best action for a state; ties go to the lowest index
    pub fn best_action(&self, state: usize) -> usize {
        let mut best = 0;
        for (action, &value) in self.values[state].iter().enumerate().skip(1) {
            if value > self.values[state][best] {
                best = action;
            }
        }
        best
    }

    fn update(&mut self, state: usize, action: usize, delta: f64) {
        self.values[state][action] += delta;
    }
}

/// Hyper-parameters of one training run
#[derive(Debug, Clone, PartialEq)]
pub struct QLearningTrainer {
    /// Learning rate (α) - how quickly new information overrides old
    learning_rate: f64,
    /// Discount factor (γ) - importance of future rewards
    discount_factor: f64,
    /// Number of training iterations, always run to completion
    iterations: usize,
    /// Wall-clock cap on a single run
    time_limit: Option<Duration>,
}

impl QLearningTrainer {
    /// Create a new trainer
    pub fn new(learning_rate: f64, discount_factor: f64, iterations: usize) -> Self {
        Self {
            learning_rate,
            discount_factor,
            iterations,
            time_limit: None,
        }
    }

    /// Abort training with `TrainingTimeout` once `limit` has elapsed
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Train a fresh value table against `rewards`
    pub fn train<R: Rng>(&self, rewards: &RewardMatrix, rng: &mut R) -> RouterResult<QTable> {
        let states = rewards.len();
        let mut q = QTable::zeros(states);
        let started = Instant::now();

        for iteration in 0..self.iterations {
            if let Some(limit) = self.time_limit {
                if started.elapsed() >= limit {
                    return Err(RouterError::training_timeout(iteration, limit));
                }
            }

            let current = rng.random_range(0..states);
            let playable = rewards.playable_actions(current);
            if playable.is_empty() {
                return Err(RouterError::no_playable_action(current));
            }
            let next = playable[rng.random_range(0..playable.len())];

            // Q(s,a) ← Q(s,a) + α[r + γ·max_a' Q(s',a') - Q(s,a)]
            let temporal_difference = rewards.get(current, next)
                + self.discount_factor * q.max_value(next)
                - q.get(current, next);
            q.update(current, next, self.learning_rate * temporal_difference);
        }

        debug!(
            iterations = self.iterations,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Q-learning run finished"
        );

        Ok(q)
    }
}

impl Default for QLearningTrainer {
    fn default() -> Self {
        Self::new(0.9, 0.75, 1000)
    }
}
