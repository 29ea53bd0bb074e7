//! Dueling Bandit Gradient Descent with Iterative Parameter Mixture
//!
//! This crate provides:
//! - `LearnerConfig`: validated hyperparameters, loadable from TOML
//! - `Projector`: unit-direction sampling and steps along a direction
//! - `DuelOracle` trait and the offline `DuelPolicy` implementations
//! - `OnlineUpdater`: the sequential per-shard DBGD loop
//! - `MixtureCoordinator`: shard partition, parallel run, weight averaging
//!
//! # Usage
//!
//! ```ignore
//! use duelrank_learner::{LearnerConfig, MixtureCoordinator};
//!
//! let config = LearnerConfig::new(1.0, 0.01, 4, "MAP")?.with_seed(7);
//! let mut coordinator = MixtureCoordinator::new(config)?;
//! let report = coordinator.update(&training_set, &mut weight)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod duel;
pub mod mixture;
pub mod projection;
pub mod updater;

pub use config::{DirectionKind, DuelKind, LearnerConfig};
pub use duel::{DuelOracle, DuelPolicy};
pub use mixture::{partition, split_shuffled, MixtureCoordinator, Partition, Shard, ShardResults, UpdateReport};
pub use projection::{Direction, Projector, MAX_DIRECTION_DRAWS};
pub use updater::{OnlineUpdater, ShardOutcome};
