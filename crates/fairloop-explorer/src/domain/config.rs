//! Exploration Configuration
//!
//! # Overview
//!
//! [`Configuration`] is consumed, never owned, by strategies and engines.
//! It is a plain serializable record with defaults suited to quick random
//! testing; [`ConfigurationBuilder`] offers chained setters.
//!
//! ```rust
//! use fairloop_explorer::domain::{ConfigurationBuilder, StrategyKind};
//!
//! let config = ConfigurationBuilder::new()
//!     .iterations(100)
//!     .strategy(StrategyKind::Random)
//!     .random_seed(7)
//!     .enable_cycle_detection(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.scheduling_iterations, 100);
//! ```

use super::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base exploration strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Seeded uniform random choices
    #[default]
    Random,
    /// Exhaustive depth-first search
    Dfs,
    /// Depth-first search with partial-order reduction
    Dpor,
    /// Replay of a recorded trace
    Replay,
}

impl StrategyKind {
    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Dfs => "dfs",
            Self::Dpor => "dpor",
            Self::Replay => "replay",
        }
    }
}

/// Exploration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Number of iterations to run
    pub scheduling_iterations: usize,
    /// Step bound for unfair strategies (0 disables the bound)
    pub max_unfair_scheduling_steps: usize,
    /// Step bound for fair strategies (0 disables the bound)
    pub max_fair_scheduling_steps: usize,
    /// Liveness temperature threshold; 0 derives `10 × |cycle|` per cycle
    pub liveness_temperature_threshold: usize,
    /// Seed for every pseudo-random choice
    pub random_seed: Option<u64>,
    /// Steps executed before liveness checking starts
    pub safety_prefix_bound: usize,
    /// Wrap the base strategy with cycle-detection liveness checking
    pub enable_cycle_detection: bool,
    /// Dump schedules and candidate cycles at debug level
    pub enable_debugging: bool,
    /// Wall-clock budget for a run
    pub timeout: Option<Duration>,
    /// Minimizer trials per search bound
    pub max_random_walks: usize,
    /// Independent workers for parallel testing
    pub parallel_workers: usize,
    /// Base strategy
    pub strategy: StrategyKind,
    /// Attach the schedule trace of each buggy iteration to the report
    pub attach_bug_trace: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            scheduling_iterations: 1,
            max_unfair_scheduling_steps: 10_000,
            max_fair_scheduling_steps: 100_000,
            liveness_temperature_threshold: 0,
            random_seed: None,
            safety_prefix_bound: 0,
            enable_cycle_detection: false,
            enable_debugging: false,
            timeout: None,
            max_random_walks: 5,
            parallel_workers: 1,
            strategy: StrategyKind::Random,
            attach_bug_trace: true,
        }
    }
}

impl Configuration {
    /// Check value ranges
    pub fn validate(&self) -> EngineResult<()> {
        if self.scheduling_iterations == 0 {
            return Err(EngineError::InvalidConfiguration(
                "scheduling_iterations must be at least 1".into(),
            ));
        }
        if self.max_unfair_scheduling_steps == 0 && self.max_fair_scheduling_steps == 0 {
            return Err(EngineError::InvalidConfiguration(
                "at least one scheduling step bound must be non-zero".into(),
            ));
        }
        if self.max_random_walks == 0 {
            return Err(EngineError::InvalidConfiguration(
                "max_random_walks must be at least 1".into(),
            ));
        }
        if self.parallel_workers == 0 {
            return Err(EngineError::InvalidConfiguration(
                "parallel_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Step bound that applies to a strategy of the given fairness
    #[inline]
    pub fn step_bound(&self, is_fair: bool) -> usize {
        if is_fair {
            self.max_fair_scheduling_steps
        } else {
            self.max_unfair_scheduling_steps
        }
    }

    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON form
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::InvalidConfiguration(e.to_string()))
    }
}

/// Chained construction of a [`Configuration`]
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    /// Start from the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of iterations
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.scheduling_iterations = iterations;
        self
    }

    /// Set the step bound for unfair strategies
    pub fn max_unfair_steps(mut self, steps: usize) -> Self {
        self.config.max_unfair_scheduling_steps = steps;
        self
    }

    /// Set the step bound for fair strategies
    pub fn max_fair_steps(mut self, steps: usize) -> Self {
        self.config.max_fair_scheduling_steps = steps;
        self
    }

    /// Override the derived liveness temperature threshold
    pub fn liveness_temperature_threshold(mut self, threshold: usize) -> Self {
        self.config.liveness_temperature_threshold = threshold;
        self
    }

    /// Seed every pseudo-random choice
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Steps to run before liveness checking starts
    pub fn safety_prefix_bound(mut self, bound: usize) -> Self {
        self.config.safety_prefix_bound = bound;
        self
    }

    /// Enable liveness checking through cycle detection
    pub fn enable_cycle_detection(mut self, enable: bool) -> Self {
        self.config.enable_cycle_detection = enable;
        self
    }

    /// Enable schedule and cycle dumps
    pub fn enable_debugging(mut self, enable: bool) -> Self {
        self.config.enable_debugging = enable;
        self
    }

    /// Set a wall-clock budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Minimizer trials per bound
    pub fn max_random_walks(mut self, walks: usize) -> Self {
        self.config.max_random_walks = walks;
        self
    }

    /// Number of parallel workers
    pub fn parallel_workers(mut self, workers: usize) -> Self {
        self.config.parallel_workers = workers;
        self
    }

    /// Select the base strategy
    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Attach bug traces to reports
    pub fn attach_bug_trace(mut self, attach: bool) -> Self {
        self.config.attach_bug_trace = attach;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> EngineResult<Configuration> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.scheduling_iterations, 1);
        assert_eq!(config.max_random_walks, 5);
        assert_eq!(config.strategy, StrategyKind::Random);
        assert!(config.attach_bug_trace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_zero_workers() {
        let result = ConfigurationBuilder::new().parallel_workers(0).build();
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_step_bound_by_fairness() {
        let config = ConfigurationBuilder::new()
            .max_fair_steps(50)
            .max_unfair_steps(5)
            .build()
            .unwrap();
        assert_eq!(config.step_bound(true), 50);
        assert_eq!(config.step_bound(false), 5);
    }

    #[test]
    fn test_json_partial_document_uses_defaults() {
        let config = Configuration::from_json(r#"{"scheduling_iterations": 20, "strategy": "dpor"}"#).unwrap();
        assert_eq!(config.scheduling_iterations, 20);
        assert_eq!(config.strategy, StrategyKind::Dpor);
        assert_eq!(config.max_fair_scheduling_steps, 100_000);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ConfigurationBuilder::new()
            .random_seed(11)
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();
        let json = config.to_json().unwrap();
        assert_eq!(Configuration::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_invalid_values_rejected() {
        let result = Configuration::from_json(r#"{"max_random_walks": 0}"#);
        assert!(result.is_err());
    }
}
