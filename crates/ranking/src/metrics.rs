//! Ranking quality metrics over binary relevance
//!
//! Every function takes relevance judgments in ranked order (best first).
//! A judgment counts as relevant iff it is nonzero.
//!
//! | Metric | What it measures                                  | Range   |
//! |--------|---------------------------------------------------|---------|
//! | RR     | Reciprocal rank of the first relevant item        | 0.0-1.0 |
//! | P@k    | Fraction of the first k positions that are relevant | 0.0-1.0 |
//! | AP     | Precision averaged over each relevant item's rank | 0.0-1.0 |
//! | MRR    | Mean of RR over several rankings                  | 0.0-1.0 |
//! | MAP    | Mean of AP over several rankings                  | 0.0-1.0 |
//!
//! A ranking with no relevant item scores 0.0 on every metric.

use duelrank_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[inline]
fn is_relevant(rel: f32) -> bool {
    rel != 0.0
}

/// Reciprocal rank of the first relevant item.
///
/// ```text
/// RR = 1 / (1 + index_of_first_relevant)
/// ```
pub fn reciprocal_rank(rels: &[f32]) -> f64 {
    rels.iter()
        .position(|&r| is_relevant(r))
        .map(|index| 1.0 / (1.0 + index as f64))
        .unwrap_or(0.0)
}

/// Precision at cutoff `k`.
///
/// Divides by `k`, not by the number of judged items: positions past the
/// end of `rels` count as non-relevant. `k == 0` yields 0.0.
///
/// ```text
/// P@k = |relevant ∩ first k| / k
/// ```
pub fn precision_at_k(rels: &[f32], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits = rels.iter().take(k).filter(|&&r| is_relevant(r)).count();
    hits as f64 / k as f64
}

/// Average precision.
///
/// ```text
/// AP = Σ P@(i+1) over relevant positions i / |relevant|
/// ```
pub fn average_precision(rels: &[f32]) -> f64 {
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, &r) in rels.iter().enumerate() {
        if is_relevant(r) {
            hits += 1;
            // P@(i+1) with the running hit count
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

fn mean_of<R: AsRef<[f32]>>(lists: &[R], per_list: fn(&[f32]) -> f64) -> f64 {
    debug_assert!(!lists.is_empty(), "mean metric over zero rankings");
    if lists.is_empty() {
        return 0.0;
    }
    lists.iter().map(|rels| per_list(rels.as_ref())).sum::<f64>() / lists.len() as f64
}

/// Mean reciprocal rank over several rankings.
///
/// Callers must pass at least one ranking; release builds return 0.0 for
/// an empty slice.
pub fn mean_reciprocal_rank<R: AsRef<[f32]>>(lists: &[R]) -> f64 {
    mean_of(lists, reciprocal_rank)
}

/// Mean average precision over several rankings.
///
/// Callers must pass at least one ranking; release builds return 0.0 for
/// an empty slice.
pub fn mean_average_precision<R: AsRef<[f32]>>(lists: &[R]) -> f64 {
    mean_of(lists, average_precision)
}

// ============================================================================
// Metric
// ============================================================================

/// Metric that arbitrates duels
///
/// Resolved once from its name at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    /// Mean average precision
    #[default]
    Map,
    /// Mean reciprocal rank
    Mrr,
}

impl Metric {
    /// Canonical name, as accepted by `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Map => "MAP",
            Metric::Mrr => "MRR",
        }
    }

    /// Mean of the metric over several rankings
    pub fn evaluate<R: AsRef<[f32]>>(&self, lists: &[R]) -> f64 {
        match self {
            Metric::Map => mean_average_precision(lists),
            Metric::Mrr => mean_reciprocal_rank(lists),
        }
    }

    /// The metric of a single ranking
    pub fn evaluate_one(&self, rels: &[f32]) -> f64 {
        match self {
            Metric::Map => average_precision(rels),
            Metric::Mrr => reciprocal_rank(rels),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MAP" => Ok(Metric::Map),
            "MRR" => Ok(Metric::Mrr),
            other => Err(Error::InvalidConfig(format!(
                "invalid metric name '{}'. Expected \"MAP\" or \"MRR\".",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Metric {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Metric> for String {
    fn from(metric: Metric) -> Self {
        metric.name().to_string()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
