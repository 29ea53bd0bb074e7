//! Linear scoring and ranking
//!
//! Scores every candidate row of a feature matrix against a weight vector
//! and orders candidates by descending score. Equal scores keep their
//! original row order, so the same inputs always produce the same ranking.

use duelrank_core::{Error, FeatureMatrix, Result, SparseVector};
use std::cmp::Ordering;

/// One candidate in a ranking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDoc {
    /// Relevance judgment of the candidate
    pub relevance: f32,
    /// Row index in the feature matrix
    pub doc_index: usize,
    /// Predicted score
    pub score: f32,
}

/// Candidates ordered best first
///
/// This is an ephemeral view recomputed per duel, never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
    docs: Vec<RankedDoc>,
}

impl Ranking {
    /// Ranked candidates
    pub fn docs(&self) -> &[RankedDoc] {
        &self.docs
    }

    /// Relevance judgments in ranked order
    pub fn relevances(&self) -> Vec<f32> {
        self.docs.iter().map(|d| d.relevance).collect()
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when there are no candidates
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Score each row of `features` against `weight`, in row order.
///
/// # Errors
///
/// A matrix wider than the weight is a `DimensionMismatch`; narrower
/// matrices are fine (missing columns are zero).
pub fn score(features: &FeatureMatrix, weight: &SparseVector) -> Result<Vec<f32>> {
    if features.dims() > weight.dims() {
        return Err(Error::DimensionMismatch {
            expected: weight.dims(),
            actual: features.dims(),
        });
    }
    Ok(features.rows().map(|row| row.dot(weight)).collect())
}

/// Rank candidates by descending score, ties by ascending row index.
///
/// # Errors
///
/// `labels` must have one entry per row; scoring errors propagate.
pub fn rank(features: &FeatureMatrix, labels: &[f32], weight: &SparseVector) -> Result<Ranking> {
    if labels.len() != features.n_rows() {
        return Err(Error::LengthMismatch {
            what: "relevance labels",
            expected: features.n_rows(),
            actual: labels.len(),
        });
    }

    let scores = score(features, weight)?;
    let mut docs: Vec<RankedDoc> = labels
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(doc_index, (&relevance, score))| RankedDoc {
            relevance,
            doc_index,
            score,
        })
        .collect();

    docs.sort_by(by_score_desc);
    Ok(Ranking { docs })
}

fn by_score_desc(a: &RankedDoc, b: &RankedDoc) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.doc_index.cmp(&b.doc_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureMatrix {
        FeatureMatrix::from_dense_rows(
            3,
            &[
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![1.0, 1.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_score_row_order() {
        let w = SparseVector::from_dense(&[1.0, 2.0, 3.0]);
        let scores = score(&features(), &w).unwrap();
        assert_eq!(scores, vec![1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_score_narrower_matrix() {
        let w = SparseVector::from_dense(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(score(&features(), &w).unwrap().len(), 4);
    }

    #[test]
    fn test_score_wider_matrix_rejected() {
        let w = SparseVector::zeros(2);
        assert!(matches!(
            score(&features(), &w),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_rank_descending_with_index_tie_break() {
        let w = SparseVector::from_dense(&[1.0, 2.0, 3.0]);
        let labels = [0.0, 0.0, 1.0, 0.5];
        let ranking = rank(&features(), &labels, &w).unwrap();

        let order: Vec<usize> = ranking.docs().iter().map(|d| d.doc_index).collect();
        // rows 2 and 3 tie at 3.0; row 2 comes first
        assert_eq!(order, vec![2, 3, 1, 0]);
        assert_eq!(ranking.relevances(), vec![1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_rank_zero_weight_keeps_row_order() {
        let w = SparseVector::zeros(3);
        let ranking = rank(&features(), &[1.0, 2.0, 3.0, 4.0], &w).unwrap();
        assert_eq!(ranking.relevances(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rank_label_count_mismatch() {
        let w = SparseVector::zeros(3);
        assert!(matches!(
            rank(&features(), &[1.0], &w),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_rank_is_deterministic() {
        let w = SparseVector::from_dense(&[0.3, 0.3, 0.3]);
        let labels = [1.0, 0.0, 1.0, 0.0];
        let first = rank(&features(), &labels, &w).unwrap();
        for _ in 0..5 {
            assert_eq!(rank(&features(), &labels, &w).unwrap(), first);
        }
    }
}
