//! Ranking infrastructure for duelrank
//!
//! This crate provides:
//! - Pure ranking metrics over binary relevance (RR, P@k, AP, MRR, MAP)
//! - `Metric`, the duel-arbitrating metric chosen at configuration time
//! - A linear predictor that scores and ranks candidate documents
//! - Whole-set evaluation of a weight vector

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod evaluation;
pub mod metrics;
pub mod predictor;

pub use evaluation::{evaluate, Evaluation};
pub use metrics::{
    average_precision, mean_average_precision, mean_reciprocal_rank, precision_at_k,
    reciprocal_rank, Metric,
};
pub use predictor::{rank, score, RankedDoc, Ranking};
