//! Duels between a candidate and the current weight
//!
//! A duel ranks one query's candidates with both weights, scores both
//! rankings with the configured metric and decides whether the candidate
//! wins. Judgments come from offline relevance labels; an oracle backed by
//! live feedback (e.g. interleaved result lists) plugs in through
//! [`DuelOracle`].

use crate::config::{DuelKind, LearnerConfig};
use duelrank_core::{Query, Result, SparseVector};
use duelrank_ranking::{rank, Metric};
use rand::{Rng, RngCore};

/// Decides whether a candidate weight beats the current weight on one query
///
/// # Thread Safety
///
/// Oracles are shared by every shard worker and must be Send + Sync.
pub trait DuelOracle: Send + Sync {
    /// Returns true iff `candidate` wins against `current` on `query`
    fn duel(
        &self,
        query: &Query,
        candidate: &SparseVector,
        current: &SparseVector,
        metric: Metric,
        rng: &mut dyn RngCore,
    ) -> Result<bool>;

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

/// Offline duel against relevance labels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuelPolicy {
    /// Candidate wins with probability `1 - sigmoid(C·m(current) - C·m(candidate))`
    Probabilistic {
        /// Metric scale `C`
        scale: f64,
    },
    /// Candidate wins iff `m(candidate) > m(current)`
    Deterministic,
}

impl Default for DuelPolicy {
    fn default() -> Self {
        DuelPolicy::Probabilistic { scale: 10.0 }
    }
}

impl DuelPolicy {
    /// Policy selected by a learner configuration
    pub fn from_config(config: &LearnerConfig) -> Self {
        match config.duel {
            DuelKind::Probabilistic => DuelPolicy::Probabilistic {
                scale: config.duel_scale,
            },
            DuelKind::Deterministic => DuelPolicy::Deterministic,
        }
    }

    /// Probability that the candidate wins given both metric values.
    ///
    /// Non-decreasing in `candidate_metric - current_metric`. The
    /// deterministic policy is the step function this converges to as the
    /// scale grows.
    pub fn win_probability(&self, current_metric: f64, candidate_metric: f64) -> f64 {
        match *self {
            DuelPolicy::Probabilistic { scale } => {
                1.0 - sigmoid(scale * current_metric - scale * candidate_metric)
            }
            DuelPolicy::Deterministic => {
                if candidate_metric > current_metric {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl DuelOracle for DuelPolicy {
    fn duel(
        &self,
        query: &Query,
        candidate: &SparseVector,
        current: &SparseVector,
        metric: Metric,
        rng: &mut dyn RngCore,
    ) -> Result<bool> {
        let current_rels = rank(query.features(), query.labels(), current)?.relevances();
        let candidate_rels = rank(query.features(), query.labels(), candidate)?.relevances();

        let current_metric = metric.evaluate(&[current_rels]);
        let candidate_metric = metric.evaluate(&[candidate_rels]);

        match self {
            DuelPolicy::Deterministic => Ok(candidate_metric > current_metric),
            DuelPolicy::Probabilistic { .. } => {
                let p = self.win_probability(current_metric, candidate_metric);
                Ok(rng.gen::<f64>() < p)
            }
        }
    }

    fn name(&self) -> &str {
        match self {
            DuelPolicy::Probabilistic { .. } => "probabilistic",
            DuelPolicy::Deterministic => "deterministic",
        }
    }
}
