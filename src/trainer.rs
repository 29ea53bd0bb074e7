//! Multi-epoch training driver
//!
//! Wraps a [`MixtureCoordinator`] with the outer loop: one mixture round per
//! epoch, whole-set evaluation after each round, and an optional checkpoint
//! store that receives the weight after every committed epoch.

use duelrank_core::{Error, Result, TrainingSet, WeightVector, DEFAULT_DIMS};
use duelrank_durability::CheckpointStore;
use duelrank_learner::{LearnerConfig, MixtureCoordinator};
use duelrank_ranking::{evaluate, Evaluation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Training run configuration, usually loaded from `duelrank.toml`.
///
/// # Example
///
/// ```toml
/// epochs = 10
/// dims = 100000
/// checkpoint_dir = "checkpoints"
/// checkpoint_prefix = "weight"
///
/// [learner]
/// delta = 1.0
/// gamma = 0.01
/// process_num = 4
/// metric = "MAP"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Mixture rounds run by [`Trainer::train`]
    #[serde(default = "default_epochs")]
    pub epochs: u64,
    /// Dimensionality of a fresh weight
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Where checkpoints go; no checkpoints are written when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<PathBuf>,
    /// File-name prefix of checkpoints
    #[serde(default = "default_checkpoint_prefix")]
    pub checkpoint_prefix: String,
    /// Learner hyperparameters
    #[serde(default)]
    pub learner: LearnerConfig,
}

fn default_epochs() -> u64 {
    1
}

fn default_dims() -> usize {
    DEFAULT_DIMS
}

fn default_checkpoint_prefix() -> String {
    "weight".to_string()
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            dims: default_dims(),
            checkpoint_dir: None,
            checkpoint_prefix: default_checkpoint_prefix(),
            learner: LearnerConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Check every option, including the nested learner section.
    pub fn validate(&self) -> Result<()> {
        if self.dims == 0 {
            return Err(Error::InvalidConfig("dims must be at least 1".to_string()));
        }
        if self.checkpoint_prefix.is_empty()
            || self.checkpoint_prefix.contains(std::path::is_separator)
        {
            return Err(Error::InvalidConfig(format!(
                "checkpoint_prefix must be a non-empty file name, got '{}'",
                self.checkpoint_prefix
            )));
        }
        self.learner.validate()
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TrainerConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse trainer config: {}", e)))?;
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

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Mixture rounds per training run
epochs = 1

# Dimensionality of a fresh weight vector
dims = 100000

# Checkpoints are written after every epoch when a directory is set
# checkpoint_dir = "checkpoints"
checkpoint_prefix = "weight"

[learner]
delta = 1.0
gamma = 0.01
process_num = 1
metric = "MAP"
duel = "probabilistic"
duel_scale = 10.0
direction = "positive"
# seed = 42
partition_seed = 0
"#
    }
}

/// Outcome of one training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Weight epoch after the round
    pub epoch: u64,
    /// Duels fought across all shards
    pub duels: usize,
    /// Duels won across all shards
    pub wins: usize,
    /// Training-set quality after the round
    pub evaluation: Evaluation,
    /// Checkpoint written for this epoch, if any
    pub checkpoint: Option<PathBuf>,
}

/// Epoch loop over a mixture coordinator
pub struct Trainer {
    config: TrainerConfig,
    coordinator: MixtureCoordinator,
    store: Option<CheckpointStore>,
}

impl Trainer {
    /// Build a trainer, opening the checkpoint store if one is configured.
    ///
    /// Temporary files from interrupted dumps are removed on open.
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let coordinator = MixtureCoordinator::new(config.learner.clone())?;
        let store = match &config.checkpoint_dir {
            Some(dir) => {
                let store = CheckpointStore::open(dir, config.checkpoint_prefix.as_str())?;
                store.cleanup_temp_files()?;
                Some(store)
            }
            None => None,
        };
        Ok(Trainer {
            config,
            coordinator,
            store,
        })
    }

    /// Trainer around an already-built coordinator
    pub fn with_coordinator(
        config: TrainerConfig,
        coordinator: MixtureCoordinator,
        store: Option<CheckpointStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Trainer {
            config,
            coordinator,
            store,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// The checkpoint store, if configured
    pub fn store(&self) -> Option<&CheckpointStore> {
        self.store.as_ref()
    }

    /// Starting weight: the latest checkpoint, or a zero weight of
    /// `config.dims` at epoch 0 when there is none.
    pub fn resume(&self) -> Result<WeightVector> {
        let restored = match &self.store {
            Some(store) => store.latest()?,
            None => None,
        };
        match restored {
            Some(weight) => {
                info!(
                    target: "duelrank::trainer",
                    epoch = weight.epoch(),
                    dims = weight.dims(),
                    "Resumed from checkpoint"
                );
                Ok(weight)
            }
            None => Ok(WeightVector::new(self.config.dims)),
        }
    }

    /// Run `config.epochs` rounds
    pub fn train(&mut self, set: &TrainingSet, weight: &mut WeightVector) -> Result<Vec<EpochReport>> {
        let epochs = self.config.epochs;
        self.fit(set, weight, epochs)
    }

    /// Run `epochs` mixture rounds over `set`.
    ///
    /// A weight narrower than the widest feature matrix in `set` is grown
    /// on a copy, which replaces `weight` only once the first round
    /// commits. A failed round stops the loop with `weight` left at the
    /// last committed epoch, dimensionality included.
    pub fn fit(
        &mut self,
        set: &TrainingSet,
        weight: &mut WeightVector,
        epochs: u64,
    ) -> Result<Vec<EpochReport>> {
        let needed = set.max_dims();
        let mut grown = None;
        if needed > weight.dims() {
            info!(
                target: "duelrank::trainer",
                from = weight.dims(),
                to = needed,
                "Extending weight dimensionality"
            );
            let mut wider = weight.clone();
            wider.extend_dims(needed)?;
            grown = Some(wider);
        }

        let mut reports = Vec::new();
        for _ in 0..epochs {
            let round = match grown.take() {
                Some(mut wider) => {
                    let round = self.coordinator.update(set, &mut wider)?;
                    *weight = wider;
                    round
                }
                None => self.coordinator.update(set, weight)?,
            };
            let evaluation = evaluate(set, weight.vector())?;
            let checkpoint = match &self.store {
                Some(store) => Some(store.dump(weight)?),
                None => None,
            };

            info!(
                target: "duelrank::trainer",
                epoch = round.epoch,
                map = evaluation.map,
                mrr = evaluation.mrr,
                wins = round.wins,
                duels = round.duels,
                "Epoch complete"
            );

            reports.push(EpochReport {
                epoch: round.epoch,
                duels: round.duels,
                wins: round.wins,
                evaluation,
                checkpoint,
            });
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_toml_parses_to_default() {
        let config = TrainerConfig::from_toml_str(TrainerConfig::default_toml()).unwrap();
        assert_eq!(config, TrainerConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TrainerConfig::from_toml_str("").unwrap();
        assert_eq!(config.dims, 100_000);
        assert_eq!(config.epochs, 1);
        assert!(config.checkpoint_dir.is_none());
        assert_eq!(config.learner.process_num, 1);
    }

    #[test]
    fn test_nested_learner_section() {
        let config = TrainerConfig::from_toml_str(
            "epochs = 3\n[learner]\nprocess_num = 4\nmetric = \"MRR\"\n",
        )
        .unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.learner.process_num, 4);
        assert_eq!(config.learner.metric.name(), "MRR");
    }

    #[test]
    fn test_invalid_learner_section_rejected() {
        let result = TrainerConfig::from_toml_str("[learner]\nmetric = \"NDCG\"\n");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let config = TrainerConfig {
            checkpoint_prefix: "a/b".to_string(),
            ..TrainerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_dims_rejected() {
        let config = TrainerConfig {
            dims: 0,
            ..TrainerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("duelrank.toml");
        let config = TrainerConfig {
            epochs: 5,
            checkpoint_dir: Some(dir.path().join("ckpt")),
            ..TrainerConfig::default()
        };
        config.write_to_file(&path).unwrap();
        assert_eq!(TrainerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = TrainerConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_resume_without_store_is_fresh() {
        let trainer = Trainer::new(TrainerConfig {
            dims: 16,
            ..TrainerConfig::default()
        })
        .unwrap();
        let weight = trainer.resume().unwrap();
        assert_eq!(weight.dims(), 16);
        assert_eq!(weight.epoch(), 0);
    }
}
