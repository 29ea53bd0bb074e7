//! Iterative Parameter Mixture
//!
//! One mixture round moves through
//! `IDLE → PARTITIONED → RUNNING → MERGED → IDLE`, and each state is a type:
//!
//! ```text
//! partition(set, P, seed) -> Partition      shuffled, contiguous shards
//! Partition::run(...)     -> ShardResults   one OnlineUpdater per shard, in parallel
//! ShardResults::merge()   -> SparseVector   elementwise mean of the P shard weights
//! ```
//!
//! # Concurrency
//!
//! Shards run on a dedicated rayon pool with one thread per shard. The
//! global weight is lent to every task as a read-only snapshot; each task
//! clones its own copy. The merge happens on the calling thread after every
//! task has returned, and it is the only write. If any shard fails, the
//! round is abandoned and the global weight is left as it was.
//!
//! # Randomness
//!
//! The shard permutation is drawn from `partition_seed` every round. The
//! coordinator's exploration RNG draws one seed per shard before fan-out,
//! so a seeded coordinator is reproducible regardless of thread scheduling.

use crate::config::LearnerConfig;
use crate::duel::{DuelOracle, DuelPolicy};
use crate::updater::{OnlineUpdater, ShardOutcome};
use duelrank_core::{
    Error, FeatureMatrix, Query, QueryId, RelevanceVector, Result, SparseVector, TrainingSet,
    WeightVector,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

// ============================================================================
// Partition
// ============================================================================

/// Shuffle `items` with `seed` and cut them into `n_shards` contiguous runs.
///
/// Shard `p` holds positions `N*p/P .. N*(p+1)/P` of the permutation, so
/// sizes differ by at most one and every item lands in exactly one shard.
pub fn split_shuffled<T>(mut items: Vec<T>, n_shards: usize, seed: u64) -> Vec<Vec<T>> {
    debug_assert!(n_shards > 0);
    let n = items.len();
    items.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut shards = Vec::with_capacity(n_shards);
    let mut rest = items.into_iter();
    for p in 0..n_shards {
        let start = n * p / n_shards;
        let end = n * (p + 1) / n_shards;
        shards.push(rest.by_ref().take(end - start).collect());
    }
    shards
}

/// Queries assigned to one worker
#[derive(Debug, Clone)]
pub struct Shard<'a> {
    /// Shard index
    pub index: usize,
    /// Query ids in processing order
    pub ids: Vec<&'a QueryId>,
}

/// A training set cut into shards
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    set: &'a TrainingSet,
    shards: Vec<Shard<'a>>,
}

/// Partition `set` into `n_shards` shards of a `seed`-determined permutation.
pub fn partition(set: &TrainingSet, n_shards: usize, seed: u64) -> Partition<'_> {
    let ids: Vec<&QueryId> = set.ids().collect();
    let shards = split_shuffled(ids, n_shards, seed)
        .into_iter()
        .enumerate()
        .map(|(index, ids)| Shard { index, ids })
        .collect();
    Partition { set, shards }
}

impl<'a> Partition<'a> {
    /// The shards, in index order
    pub fn shards(&self) -> &[Shard<'a>] {
        &self.shards
    }

    /// Run one updater per shard in parallel and wait for all of them.
    ///
    /// `shard_seeds` must hold one seed per shard.
    ///
    /// # Errors
    ///
    /// The first failing shard aborts the run with `Error::ShardFailed`;
    /// no partial results are returned.
    pub fn run(
        &self,
        updater: &OnlineUpdater<'_>,
        snapshot: &SparseVector,
        shard_seeds: &[u64],
    ) -> Result<ShardResults> {
        if shard_seeds.len() != self.shards.len() {
            return Err(Error::LengthMismatch {
                what: "shard seeds",
                expected: self.shards.len(),
                actual: shard_seeds.len(),
            });
        }

        let outcomes = self
            .shards
            .par_iter()
            .zip(shard_seeds.par_iter())
            .map(|(shard, &seed)| {
                let queries: Vec<&Query> = shard
                    .ids
                    .iter()
                    .filter_map(|id| self.set.get(id))
                    .collect();
                let mut rng = StdRng::seed_from_u64(seed);
                updater
                    .run(shard.index, &queries, snapshot, &mut rng)
                    .map_err(|e| Error::shard_failed(shard.index, e))
            })
            .collect::<Result<Vec<ShardOutcome>>>()?;

        Ok(ShardResults { outcomes })
    }
}

// ============================================================================
// ShardResults
// ============================================================================

/// Every shard's outcome, after the barrier
#[derive(Debug, Clone)]
pub struct ShardResults {
    outcomes: Vec<ShardOutcome>,
}

impl ShardResults {
    /// Outcomes in shard order
    pub fn outcomes(&self) -> &[ShardOutcome] {
        &self.outcomes
    }

    /// Elementwise mean of the shard weights: `(1 / P) * Σ w_p`
    ///
    /// # Errors
    ///
    /// Fails on an empty result set or mismatched shard dimensions.
    pub fn merge(&self) -> Result<SparseVector> {
        let first = self.outcomes.first().ok_or_else(|| {
            Error::InvalidOperation("cannot merge zero shard results".to_string())
        })?;

        let mut sum = SparseVector::zeros(first.weight.dims());
        for outcome in &self.outcomes {
            sum = sum.add_scaled(&outcome.weight, 1.0)?;
        }
        Ok(sum.scaled(1.0 / self.outcomes.len() as f32))
    }

    /// Total duels fought
    pub fn duels(&self) -> usize {
        self.outcomes.iter().map(|o| o.duels).sum()
    }

    /// Total duels won by the candidate
    pub fn wins(&self) -> usize {
        self.outcomes.iter().map(|o| o.wins).sum()
    }
}

// ============================================================================
// MixtureCoordinator
// ============================================================================

/// Summary of one completed mixture round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Weight epoch after the round
    pub epoch: u64,
    /// Queries per shard
    pub shard_sizes: Vec<usize>,
    /// Duels fought across all shards
    pub duels: usize,
    /// Duels won across all shards
    pub wins: usize,
}

/// Runs DBGD shards in parallel and mixes their weights
pub struct MixtureCoordinator {
    config: LearnerConfig,
    oracle: Box<dyn DuelOracle>,
    pool: rayon::ThreadPool,
    rng: StdRng,
}

impl MixtureCoordinator {
    /// Coordinator with the duel policy named in `config`.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or failure to start the worker pool.
    pub fn new(config: LearnerConfig) -> Result<Self> {
        let oracle = Box::new(DuelPolicy::from_config(&config));
        Self::with_oracle(config, oracle)
    }

    /// Coordinator with a custom duel oracle.
    pub fn with_oracle(config: LearnerConfig, oracle: Box<dyn DuelOracle>) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.process_num)
            .thread_name(|i| format!("duelrank-shard-{}", i))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to start worker pool: {}", e)))?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(MixtureCoordinator {
            config,
            oracle,
            pool,
            rng,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// One mixture round over `set`, committed into `weight`.
    ///
    /// On success the weight holds the mean of the shard weights and its
    /// epoch has advanced by exactly one; dimensionality is unchanged. On
    /// failure the weight is untouched.
    pub fn update(&mut self, set: &TrainingSet, weight: &mut WeightVector) -> Result<UpdateReport> {
        let n_shards = self.config.process_num;
        let dims = weight.dims();

        let partition = partition(set, n_shards, self.config.partition_seed);
        let shard_sizes: Vec<usize> = partition.shards().iter().map(|s| s.ids.len()).collect();
        debug!(
            target: "duelrank::mixture",
            epoch = weight.epoch(),
            queries = set.len(),
            ?shard_sizes,
            "Partitioned training set"
        );

        let shard_seeds: Vec<u64> = (0..n_shards).map(|_| self.rng.gen()).collect();
        let updater = OnlineUpdater::new(&self.config, dims, self.oracle.as_ref());
        let snapshot = weight.vector();

        let results = self
            .pool
            .install(|| partition.run(&updater, snapshot, &shard_seeds))?;

        let merged = results.merge()?;
        weight.commit_round(merged)?;

        info!(
            target: "duelrank::mixture",
            epoch = weight.epoch(),
            shards = n_shards,
            duels = results.duels(),
            wins = results.wins(),
            "Mixture round committed"
        );

        Ok(UpdateReport {
            epoch: weight.epoch(),
            shard_sizes,
            duels: results.duels(),
            wins: results.wins(),
        })
    }

    /// [`update`](Self::update) from separate feature and label maps.
    ///
    /// # Errors
    ///
    /// `Error::KeySetMismatch` if the maps disagree on query ids; nothing is
    /// partitioned in that case.
    pub fn update_from_maps(
        &mut self,
        features: HashMap<QueryId, FeatureMatrix>,
        labels: HashMap<QueryId, RelevanceVector>,
        weight: &mut WeightVector,
    ) -> Result<UpdateReport> {
        let set = TrainingSet::from_maps(features, labels)?;
        self.update(&set, weight)
    }
}
