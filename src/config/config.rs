use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{map_io_err, RouterError, RouterResult};
use crate::reinforcement::graph::{WarehouseGraph, REFERENCE_EDGES, REFERENCE_LOCATIONS};
use crate::reinforcement::reward::RewardShaping;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Priority locations used when the caller does not name any
    pub default_priorities: Vec<String>,
    pub topology: TopologyConfig,
    pub training: TrainingConfig,
    pub log: RouteLogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Location names in state-index order
    pub locations: Vec<String>,
    /// Undirected corridors between locations
    pub edges: Vec<(String, String)>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            locations: REFERENCE_LOCATIONS.iter().map(|l| l.to_string()).collect(),
            edges: REFERENCE_EDGES
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }
}

impl TopologyConfig {
    pub fn build_graph(&self) -> RouterResult<WarehouseGraph> {
        WarehouseGraph::new(&self.locations, &self.edges)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub iterations: usize,
    pub goal_reward: f64,
    pub priority_step: f64,
    /// Greedy walks may take at most `route_step_factor * N` moves
    pub route_step_factor: usize,
    /// Total training runs per leg before a retryable error surfaces
    pub max_attempts: usize,
    pub time_limit_ms: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.9,
            discount_factor: 0.75,
            iterations: 1000,
            goal_reward: 1000.0,
            priority_step: 10.0,
            route_step_factor: 2,
            max_attempts: 3,
            time_limit_ms: None,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> RouterResult<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(RouterError::invalid_config(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.discount_factor >= 0.0 && self.discount_factor < 1.0) {
            return Err(RouterError::invalid_config(format!(
                "discount_factor must be in [0, 1), got {}",
                self.discount_factor
            )));
        }
        if self.iterations == 0 {
            return Err(RouterError::invalid_config("iterations must be positive"));
        }
        if !(self.goal_reward > 0.0) {
            return Err(RouterError::invalid_config("goal_reward must be positive"));
        }
        if !(self.priority_step >= 0.0) {
            return Err(RouterError::invalid_config(
                "priority_step must not be negative",
            ));
        }
        if self.route_step_factor == 0 {
            return Err(RouterError::invalid_config(
                "route_step_factor must be positive",
            ));
        }
        if self.max_attempts == 0 {
            return Err(RouterError::invalid_config("max_attempts must be positive"));
        }
        Ok(())
    }

    pub fn shaping(&self) -> RewardShaping {
        RewardShaping {
            goal_reward: self.goal_reward,
            priority_step: self.priority_step,
            ..RewardShaping::default()
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteLogConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for RouteLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("optimal_routes.csv"),
        }
    }
}

impl RouterConfig {
    pub fn load(path: &Path) -> RouterResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content = std::fs::read_to_string(path).map_err(map_io_err(path))?;

        match ext {
            "json" => Ok(serde_json::from_str(&content)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
            "toml" => Ok(toml::from_str(&content)?),
            _ => Err(RouterError::invalid_argument(format!(
                "Unsupported config format: {}",
                ext
            ))),
        }
    }

    pub fn save(&self, path: &Path) -> RouterResult<()> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let content = match ext {
            "json" => serde_json::to_string_pretty(self)?,
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "toml" => toml::to_string(self)?,
            _ => {
                return Err(RouterError::invalid_argument(format!(
                    "Unsupported config format: {}",
                    ext
                )))
            }
        };

        std::fs::write(path, content).map_err(map_io_err(path))?;
        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qroute")
            .join("config.toml")
    }

    /// Load from `path` when given, else from the default location if it
    /// exists, else fall back to built-in defaults
    pub fn resolve(path: Option<&Path>) -> RouterResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let candidate = Self::default_config_path();
                if candidate.exists() {
                    Self::load(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_reference() {
        let config = RouterConfig::default();
        let graph = config.topology.build_graph().unwrap();
        assert_eq!(graph, WarehouseGraph::reference());
        assert_eq!(config.training.learning_rate, 0.9);
        assert_eq!(config.training.discount_factor, 0.75);
        assert_eq!(config.training.iterations, 1000);
        assert_eq!(config.training.shaping().goal_reward, 1000.0);
        assert!(config.training.validate().is_ok());
    }

    #[test]
    fn test_round_trip_all_formats() {
        let dir = tempdir().unwrap();
        let mut config = RouterConfig::default();
        config.training.seed = Some(99);
        config.training.time_limit_ms = Some(250);
        config.default_priorities = vec!["D".to_string(), "K".to_string()];

        for name in ["config.json", "config.yaml", "config.toml"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            let loaded = RouterConfig::load(&path).unwrap();
            assert_eq!(loaded, config, "round trip through {}", name);
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[training]\niterations = 5000\nseed = 7\n").unwrap();

        let config = RouterConfig::load(&path).unwrap();
        assert_eq!(config.training.iterations, 5000);
        assert_eq!(config.training.seed, Some(7));
        assert_eq!(config.training.learning_rate, 0.9);
        assert_eq!(config.topology, TopologyConfig::default());
        assert!(config.log.enabled);
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            RouterConfig::load(&path),
            Err(RouterError::InvalidArgument { .. })
        ));
        assert!(matches!(
            RouterConfig::load(&dir.path().join("missing.toml")),
            Err(RouterError::Io { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_hyper_parameters() {
        let bad = [
            TrainingConfig {
                learning_rate: 0.0,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                discount_factor: 1.0,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                iterations: 0,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                route_step_factor: 0,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                max_attempts: 0,
                ..TrainingConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(RouterError::InvalidConfig { .. })
            ));
        }
    }
}
