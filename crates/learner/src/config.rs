//! Learner configuration
//!
//! Every option is validated when the configuration is built or parsed, so
//! a bad value (an unknown metric, a non-positive step size) is rejected
//! before any training starts.

use duelrank_core::{Error, Result};
use duelrank_ranking::Metric;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Duel arbitration policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelKind {
    /// Candidate wins with sigmoid probability of the scaled metric gap
    #[default]
    Probabilistic,
    /// Candidate wins iff its metric is strictly larger
    Deterministic,
}

/// Distribution of each coordinate of a sampled direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionKind {
    /// Uniform on `[0, 1)`
    #[default]
    Positive,
    /// Uniform on `[-1, 1)`
    Symmetric,
}

/// Training hyperparameters.
///
/// # Example
///
/// ```toml
/// delta = 1.0
/// gamma = 0.01
/// process_num = 4
/// metric = "MAP"
/// duel = "probabilistic"
/// duel_scale = 10.0
/// direction = "positive"
/// seed = 7
/// partition_seed = 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Exploration step size
    #[serde(default = "default_delta")]
    pub delta: f32,
    /// Exploitation step size, typically much smaller than `delta`
    #[serde(default = "default_gamma")]
    pub gamma: f32,
    /// Number of shards and worker threads
    #[serde(default = "default_process_num")]
    pub process_num: usize,
    /// Metric that arbitrates duels: `"MAP"` or `"MRR"`
    #[serde(default)]
    pub metric: Metric,
    /// Duel policy
    #[serde(default)]
    pub duel: DuelKind,
    /// Metric scale of the probabilistic duel
    #[serde(default = "default_duel_scale")]
    pub duel_scale: f64,
    /// Direction sampling distribution
    #[serde(default)]
    pub direction: DirectionKind,
    /// Exploration seed; `None` seeds from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Seed of the shard permutation, reused every round
    #[serde(default)]
    pub partition_seed: u64,
}

fn default_delta() -> f32 {
    1.0
}

fn default_gamma() -> f32 {
    0.01
}

fn default_process_num() -> usize {
    1
}

fn default_duel_scale() -> f64 {
    10.0
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            delta: default_delta(),
            gamma: default_gamma(),
            process_num: default_process_num(),
            metric: Metric::default(),
            duel: DuelKind::default(),
            duel_scale: default_duel_scale(),
            direction: DirectionKind::default(),
            seed: None,
            partition_seed: 0,
        }
    }
}

impl LearnerConfig {
    /// Build and validate from the four core options.
    ///
    /// # Errors
    ///
    /// Rejects an unknown metric name and out-of-range values.
    pub fn new(delta: f32, gamma: f32, process_num: usize, metric: &str) -> Result<Self> {
        let config = Self {
            delta,
            gamma,
            process_num,
            metric: metric.parse()?,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Builder: set the exploration seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder: set the duel policy
    pub fn with_duel(mut self, duel: DuelKind) -> Self {
        self.duel = duel;
        self
    }

    /// Builder: set the direction distribution
    pub fn with_direction(mut self, direction: DirectionKind) -> Self {
        self.direction = direction;
        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "delta must be a positive number, got {}",
                self.delta
            )));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "gamma must be a positive number, got {}",
                self.gamma
            )));
        }
        if self.process_num == 0 {
            return Err(Error::InvalidConfig(
                "process_num must be at least 1".to_string(),
            ));
        }
        if !(self.duel_scale.is_finite() && self.duel_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "duel_scale must be a positive number, got {}",
                self.duel_scale
            )));
        }
        Ok(())
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LearnerConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse learner config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::InvalidConfig(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Exploration step size (candidate = w + delta * u)
delta = 1.0

# Exploitation step size applied when the candidate wins (w = w + gamma * u)
gamma = 0.01

# Number of shards trained in parallel and averaged each round
process_num = 1

# Metric that arbitrates duels: "MAP" or "MRR"
metric = "MAP"

# Duel policy: "probabilistic" (default) or "deterministic"
duel = "probabilistic"
duel_scale = 10.0

# Direction coordinates: "positive" = uniform [0,1), "symmetric" = uniform [-1,1)
direction = "positive"

# Exploration seed. Leave unset to seed from OS entropy.
# seed = 42

# Seed of the shard permutation, reused every round
partition_seed = 0
"#
    }
}
