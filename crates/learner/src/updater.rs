//! Sequential online learner for one shard
//!
//! For each query, in shard order:
//! 1. `candidate, u = explore(current, delta)`
//! 2. duel `candidate` against `current` on the query
//! 3. on a win, `current = current + gamma * u`
//!
//! Later queries see the effect of earlier adoptions; nothing is batched.

use crate::config::LearnerConfig;
use crate::duel::DuelOracle;
use crate::projection::Projector;
use duelrank_core::{Query, Result, SparseVector};
use duelrank_ranking::Metric;
use rand::RngCore;
use tracing::debug;

/// Result of running one shard to completion
#[derive(Debug, Clone, PartialEq)]
pub struct ShardOutcome {
    /// Shard index
    pub shard: usize,
    /// Weight after the last query
    pub weight: SparseVector,
    /// Duels fought (one per query)
    pub duels: usize,
    /// Duels the candidate won
    pub wins: usize,
}

/// Per-shard DBGD loop
#[derive(Clone, Copy)]
pub struct OnlineUpdater<'a> {
    projector: Projector,
    delta: f32,
    gamma: f32,
    metric: Metric,
    oracle: &'a dyn DuelOracle,
}

impl<'a> OnlineUpdater<'a> {
    /// Updater for `dims`-dimensional weights
    pub fn new(config: &LearnerConfig, dims: usize, oracle: &'a dyn DuelOracle) -> Self {
        OnlineUpdater {
            projector: Projector::new(dims, config.direction),
            delta: config.delta,
            gamma: config.gamma,
            metric: config.metric,
            oracle,
        }
    }

    /// Run every query of a shard, starting from `snapshot`.
    ///
    /// The snapshot is only read; the shard works on its own copy.
    pub fn run<R: RngCore>(
        &self,
        shard: usize,
        queries: &[&Query],
        snapshot: &SparseVector,
        rng: &mut R,
    ) -> Result<ShardOutcome> {
        let mut current = snapshot.clone();
        let mut wins = 0;

        for query in queries {
            let (candidate, direction) = self.projector.explore(&current, self.delta, rng)?;
            if self
                .oracle
                .duel(query, &candidate, &current, self.metric, rng)?
            {
                current = self.projector.project(&current, self.gamma, &direction)?;
                wins += 1;
            }
        }

        debug!(
            target: "duelrank::updater",
            shard,
            queries = queries.len(),
            wins,
            oracle = self.oracle.name(),
            "Shard finished"
        );

        Ok(ShardOutcome {
            shard,
            weight: current,
            duels: queries.len(),
            wins,
        })
    }
}
