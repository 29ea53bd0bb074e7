//! Ranking weight vector
//!
//! The trained model: one sparse vector of fixed dimensionality plus the
//! number of mixture rounds it has been through.

use crate::error::{Error, Result};
use crate::sparse::SparseVector;
use serde::{Deserialize, Serialize};

/// Default dimensionality of a fresh weight vector
pub const DEFAULT_DIMS: usize = 100_000;

/// Linear ranking weight with an epoch counter
///
/// The vector's dimensionality always equals `dims()`. Dimensionality can
/// only grow (see [`WeightVector::extend_dims`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    vector: SparseVector,
    epoch: u64,
}

impl WeightVector {
    /// Zero weight at epoch 0
    pub fn new(dims: usize) -> Self {
        WeightVector {
            vector: SparseVector::zeros(dims),
            epoch: 0,
        }
    }

    /// Wrap an existing vector
    pub fn from_vector(vector: SparseVector, epoch: u64) -> Self {
        WeightVector { vector, epoch }
    }

    /// Dimensionality
    pub fn dims(&self) -> usize {
        self.vector.dims()
    }

    /// Completed mixture rounds
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Borrow the underlying vector
    pub fn vector(&self) -> &SparseVector {
        &self.vector
    }

    /// Replace the vector and bump the epoch
    ///
    /// This is the single commit point of a mixture round.
    ///
    /// # Errors
    ///
    /// Rejects a replacement whose dimensionality differs.
    pub fn commit_round(&mut self, merged: SparseVector) -> Result<()> {
        if merged.dims() != self.dims() {
            return Err(Error::DimensionMismatch {
                expected: self.dims(),
                actual: merged.dims(),
            });
        }
        self.vector = merged;
        self.epoch += 1;
        Ok(())
    }

    /// Grow to `dims` dimensions, keeping every stored entry
    ///
    /// # Errors
    ///
    /// Shrinking is unsupported and returns `Error::InvalidOperation`.
    pub fn extend_dims(&mut self, dims: usize) -> Result<()> {
        self.vector.resize(dims)
    }

    /// One-row CSR triple `(data, indices, indptr)`
    pub fn to_csr(&self) -> (Vec<f32>, Vec<u32>, Vec<u64>) {
        (
            self.vector.values().to_vec(),
            self.vector.indices().to_vec(),
            vec![0, self.vector.nnz() as u64],
        )
    }

    /// Rebuild from a one-row CSR triple
    ///
    /// # Errors
    ///
    /// The triple must describe exactly one row covering all of `data`.
    pub fn from_csr(
        data: Vec<f32>,
        indices: Vec<u32>,
        indptr: Vec<u64>,
        dims: usize,
        epoch: u64,
    ) -> Result<Self> {
        if indptr.len() != 2 || indptr[0] != 0 || indptr[1] as usize != data.len() {
            return Err(Error::InvalidOperation(format!(
                "expected single-row indptr [0, {}], got {:?}",
                data.len(),
                indptr
            )));
        }
        let vector = SparseVector::from_parts(dims, indices, data)?;
        Ok(WeightVector { vector, epoch })
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::new(DEFAULT_DIMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_weight() {
        let w = WeightVector::new(8);
        assert_eq!(w.dims(), 8);
        assert_eq!(w.epoch(), 0);
        assert_eq!(w.vector().nnz(), 0);
    }

    #[test]
    fn test_deserialize_validates_vector() {
        let text = "epoch = 1\n\n[vector]\ndims = 2\nindices = [1, 0]\nvalues = [1.0, 2.0]\n";
        assert!(toml::from_str::<WeightVector>(text).is_err());

        let text = "epoch = 4\n\n[vector]\ndims = 3\nindices = [0, 2]\nvalues = [1.0, 2.0]\n";
        let w: WeightVector = toml::from_str(text).unwrap();
        assert_eq!(w.epoch(), 4);
        assert_eq!(w.vector().get(2), 2.0);
    }

    #[test]
    fn test_default_dims() {
        assert_eq!(WeightVector::default().dims(), DEFAULT_DIMS);
    }

    #[test]
    fn test_commit_round_bumps_epoch() {
        let mut w = WeightVector::new(3);
        w.commit_round(SparseVector::from_dense(&[1.0, 0.0, 2.0]))
            .unwrap();
        assert_eq!(w.epoch(), 1);
        assert_eq!(w.vector().get(2), 2.0);
    }

    #[test]
    fn test_commit_round_rejects_dims_change() {
        let mut w = WeightVector::new(3);
        assert!(w.commit_round(SparseVector::zeros(4)).is_err());
        assert_eq!(w.epoch(), 0);
    }

    #[test]
    fn test_extend_dims_preserves_nonzeros() {
        let mut w = WeightVector::from_vector(SparseVector::from_dense(&[0.5, 0.0, -1.0]), 4);
        w.extend_dims(6).unwrap();
        assert_eq!(w.dims(), 6);
        assert_eq!(w.epoch(), 4);
        assert_eq!(w.vector().to_dense(), vec![0.5, 0.0, -1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_extend_dims_rejects_shrink() {
        let mut w = WeightVector::new(6);
        assert!(matches!(w.extend_dims(2), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_csr_round_trip() {
        let w = WeightVector::from_vector(SparseVector::from_dense(&[0.0, 3.0, 0.0, 4.0]), 2);
        let (data, indices, indptr) = w.to_csr();
        assert_eq!(indptr, vec![0, 2]);
        let back = WeightVector::from_csr(data, indices, indptr, w.dims(), w.epoch()).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn test_from_csr_rejects_bad_indptr() {
        let err = WeightVector::from_csr(vec![1.0], vec![0], vec![0, 2], 4, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }
}
