//! Whole-set evaluation of a weight vector
//!
//! Ranks every query of a training set and reports MAP and MRR, with the
//! per-query spread for judging whether a change between epochs is noise.

use crate::metrics::{average_precision, reciprocal_rank};
use crate::predictor::rank;
use duelrank_core::{Result, SparseVector, TrainingSet};
use serde::{Deserialize, Serialize};

/// Aggregated ranking quality over a set of queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Mean average precision
    pub map: f64,
    /// Mean reciprocal rank
    pub mrr: f64,
    /// Standard deviation of per-query AP
    pub map_std: f64,
    /// Standard deviation of per-query RR
    pub mrr_std: f64,
    /// Number of queries evaluated
    pub n_queries: usize,
}

/// Rank every query in `set` with `weight` and aggregate.
///
/// An empty set evaluates to all zeros.
pub fn evaluate(set: &TrainingSet, weight: &SparseVector) -> Result<Evaluation> {
    let mut ap = Vec::with_capacity(set.len());
    let mut rr = Vec::with_capacity(set.len());

    for (_, query) in set.iter() {
        let rels = rank(query.features(), query.labels(), weight)?.relevances();
        ap.push(average_precision(&rels));
        rr.push(reciprocal_rank(&rels));
    }

    if ap.is_empty() {
        return Ok(Evaluation::default());
    }

    Ok(Evaluation {
        map: mean(&ap),
        mrr: mean(&rr),
        map_std: std_dev(&ap),
        mrr_std: std_dev(&rr),
        n_queries: ap.len(),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
