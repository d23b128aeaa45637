use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the route planner
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Unknown location: {location}")]
    UnknownLocation { location: String },

    #[error("No playable action from state {state}")]
    NoPlayableAction { state: usize },

    #[error("Route from {start} to {goal} did not reach the goal within {max_steps} steps")]
    RouteExtractionDivergence {
        start: String,
        goal: String,
        max_steps: usize,
    },

    #[error("Training exceeded its time limit of {limit:?} after {completed} iterations")]
    TrainingTimeout { completed: usize, limit: Duration },

    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {source}")]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    #[error("Parse error: {message}")]
    ParseError { message: String },
}

impl RouterError {
    /// Create a new unknown location error
    pub fn unknown_location(location: impl Into<String>) -> Self {
        Self::UnknownLocation {
            location: location.into(),
        }
    }

    /// Create a new no playable action error
    pub fn no_playable_action(state: usize) -> Self {
        Self::NoPlayableAction { state }
    }

    /// Create a new divergence error for a greedy walk
    pub fn divergence(start: impl Into<String>, goal: impl Into<String>, max_steps: usize) -> Self {
        Self::RouteExtractionDivergence {
            start: start.into(),
            goal: goal.into(),
            max_steps,
        }
    }

    /// Create a new training timeout error
    pub fn training_timeout(completed: usize, limit: Duration) -> Self {
        Self::TrainingTimeout { completed, limit }
    }

    /// Create a new invalid topology error
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Create a new invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new IO error with path context
    pub fn io_error(err: std::io::Error, path: Option<impl Into<PathBuf>>) -> Self {
        Self::Io {
            source: err,
            path: path.map(|p| p.into()),
        }
    }

    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Whether a fresh training run may succeed where this one failed.
    ///
    /// Training is stochastic, so a divergent greedy walk or a timed out run
    /// can be retried. Everything else is a caller or topology bug.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RouterError::RouteExtractionDivergence { .. } | RouterError::TrainingTimeout { .. }
        )
    }

    /// Stable tag for collaborators that map errors onto their own messages
    pub fn error_type(&self) -> &'static str {
        match self {
            RouterError::UnknownLocation { .. } => "unknown_location",
            RouterError::NoPlayableAction { .. } => "no_playable_action",
            RouterError::RouteExtractionDivergence { .. } => "route_extraction_divergence",
            RouterError::TrainingTimeout { .. } => "training_timeout",
            RouterError::InvalidTopology { .. } => "invalid_topology",
            RouterError::InvalidConfig { .. } => "invalid_config",
            RouterError::InvalidArgument { .. } => "invalid_argument",
            RouterError::Io { .. } => "io_error",
            RouterError::ParseError { .. } => "parse_error",
        }
    }
}

// Implement From for std::io::Error
impl From<std::io::Error> for RouterError {
    fn from(error: std::io::Error) -> Self {
        RouterError::io_error(error, None::<PathBuf>)
    }
}

// Implement From for serde_json::Error
impl From<serde_json::Error> for RouterError {
    fn from(error: serde_json::Error) -> Self {
        RouterError::parse_error(error.to_string())
    }
}

// Implement From for serde_yaml::Error
impl From<serde_yaml::Error> for RouterError {
    fn from(error: serde_yaml::Error) -> Self {
        RouterError::parse_error(error.to_string())
    }
}

// Implement From for toml::de::Error
impl From<toml::de::Error> for RouterError {
    fn from(error: toml::de::Error) -> Self {
        RouterError::parse_error(error.to_string())
    }
}

// Implement From for toml::ser::Error
impl From<toml::ser::Error> for RouterError {
    fn from(error: toml::ser::Error) -> Self {
        RouterError::parse_error(error.to_string())
    }
}

/// Result type alias using RouterError
pub type RouterResult<T> = Result<T, RouterError>;

/// Contextual error mapping function
pub fn map_io_err<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> RouterError {
    let path = path.into();
    move |err| RouterError::io_error(err, Some(path))
}
