//! duelrank - Dueling Bandit Gradient Descent with Iterative Parameter Mixture
//!
//! Learns a linear ranking function from per-query relevance labels. Each
//! round shards the queries, runs sequential DBGD on every shard in
//! parallel, and averages the shard weights into the next weight.
//!
//! # Quick Start
//!
//! ```ignore
//! use duelrank::{Trainer, TrainerConfig};
//!
//! let config = TrainerConfig::from_file(Path::new("duelrank.toml"))?;
//! let mut trainer = Trainer::new(config)?;
//! let mut weight = trainer.resume()?;
//! let reports = trainer.train(&training_set, &mut weight)?;
//! ```
//!
//! # Architecture
//!
//! - `duelrank-core`: sparse vectors, weights, queries, errors
//! - `duelrank-ranking`: metrics, scoring, evaluation
//! - `duelrank-learner`: projection, duels, per-shard updater, mixture
//! - `duelrank-durability`: checkpoint format and store

#![warn(missing_docs)]

pub mod trainer;

pub use trainer::{EpochReport, Trainer, TrainerConfig};

pub use duelrank_core::{
    Error, FeatureMatrix, Query, QueryId, RelevanceVector, Result, SparseRow, SparseVector,
    TrainingSet, WeightVector, DEFAULT_DIMS,
};
pub use duelrank_durability::CheckpointStore;
pub use duelrank_learner::{
    DirectionKind, DuelKind, DuelOracle, DuelPolicy, LearnerConfig, MixtureCoordinator,
    UpdateReport,
};
pub use duelrank_ranking::{evaluate, Evaluation, Metric};
