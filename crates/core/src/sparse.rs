//! Sparse vector primitives
//!
//! `SparseVector` stores sorted, unique `u32` column indices with parallel
//! `f32` values and a fixed dimensionality. It is a value type: arithmetic
//! returns new vectors and never mutates its inputs.
//!
//! `SparseRow` is a borrowed view over the same layout, used for rows of a
//! CSR feature matrix.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// SparseRow
// ============================================================================

/// Borrowed view of a sparse row (indices sorted ascending)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRow<'a> {
    indices: &'a [u32],
    values: &'a [f32],
}

impl<'a> SparseRow<'a> {
    /// Create a view; caller guarantees sorted indices and equal lengths
    pub(crate) fn new(indices: &'a [u32], values: &'a [f32]) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        SparseRow { indices, values }
    }

    /// Column indices of stored entries
    pub fn indices(&self) -> &'a [u32] {
        self.indices
    }

    /// Stored values, parallel to `indices()`
    pub fn values(&self) -> &'a [f32] {
        self.values
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Inner product with a sparse vector
    pub fn dot(&self, other: &SparseVector) -> f32 {
        merge_dot(self.indices, self.values, &other.indices, &other.values)
    }
}

/// Merge-join inner product over two sorted index lists
fn merge_dot(ai: &[u32], av: &[f32], bi: &[u32], bv: &[f32]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut acc = 0.0f64;
    while i < ai.len() && j < bi.len() {
        match ai[i].cmp(&bi[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                acc += av[i] as f64 * bv[j] as f64;
                i += 1;
                j += 1;
            }
        }
    }
    acc as f32
}

// ============================================================================
// SparseVector
// ============================================================================

/// Owned sparse vector of fixed dimensionality
///
/// Deserialization goes through [`SparseVector::from_parts`], so decoded
/// vectors satisfy the same index invariants as constructed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSparseVector")]
pub struct SparseVector {
    dims: usize,
    indices: Vec<u32>,
    values: Vec<f32>,
}

/// Unvalidated wire form of a `SparseVector`
#[derive(Deserialize)]
struct RawSparseVector {
    dims: usize,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl TryFrom<RawSparseVector> for SparseVector {
    type Error = Error;

    fn try_from(raw: RawSparseVector) -> Result<Self> {
        SparseVector::from_parts(raw.dims, raw.indices, raw.values)
    }
}

impl SparseVector {
    /// All-zero vector with no stored entries
    pub fn zeros(dims: usize) -> Self {
        SparseVector {
            dims,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from parallel index/value arrays
    ///
    /// # Errors
    ///
    /// Fails if the arrays differ in length, indices are not strictly
    /// increasing, or an index falls outside `dims`.
    pub fn from_parts(dims: usize, indices: Vec<u32>, values: Vec<f32>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(Error::LengthMismatch {
                what: "sparse values",
                expected: indices.len(),
                actual: values.len(),
            });
        }
        validate_indices(dims, &indices)?;
        Ok(SparseVector {
            dims,
            indices,
            values,
        })
    }

    /// Build from a dense slice, dropping zero entries
    pub fn from_dense(dense: &[f32]) -> Self {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (i, &v) in dense.iter().enumerate() {
            if v != 0.0 {
                indices.push(i as u32);
                values.push(v);
            }
        }
        SparseVector {
            dims: dense.len(),
            indices,
            values,
        }
    }

    /// Dimensionality
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Stored column indices, ascending
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Stored values, parallel to `indices()`
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at `index` (zero when not stored or out of range)
    pub fn get(&self, index: usize) -> f32 {
        if index >= self.dims {
            return 0.0;
        }
        match self.indices.binary_search(&(index as u32)) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate stored `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Borrow as a row view
    pub fn as_row(&self) -> SparseRow<'_> {
        SparseRow::new(&self.indices, &self.values)
    }

    /// Inner product with another vector
    pub fn dot(&self, other: &SparseVector) -> f32 {
        merge_dot(&self.indices, &self.values, &other.indices, &other.values)
    }

    /// Euclidean norm
    pub fn norm(&self) -> f32 {
        self.values
            .iter()
            .map(|&v| v as f64 * v as f64)
            .sum::<f64>()
            .sqrt() as f32
    }

    /// `alpha * self`
    pub fn scaled(&self, alpha: f32) -> SparseVector {
        SparseVector {
            dims: self.dims,
            indices: self.indices.clone(),
            values: self.values.iter().map(|&v| v * alpha).collect(),
        }
    }

    /// `self + alpha * other`
    ///
    /// Entries present in either operand are kept, including ones that
    /// cancel to zero, so the stored layout is the union of both.
    pub fn add_scaled(&self, other: &SparseVector, alpha: f32) -> Result<SparseVector> {
        if self.dims != other.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims,
                actual: other.dims,
            });
        }

        let capacity = self.nnz().max(other.nnz());
        let mut indices = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);
        let (mut i, mut j) = (0, 0);

        while i < self.indices.len() || j < other.indices.len() {
            let left = self.indices.get(i).copied();
            let right = other.indices.get(j).copied();
            match (left, right) {
                (Some(a), Some(b)) if a == b => {
                    indices.push(a);
                    values.push(self.values[i] + alpha * other.values[j]);
                    i += 1;
                    j += 1;
                }
                (Some(a), Some(b)) if a < b => {
                    indices.push(a);
                    values.push(self.values[i]);
                    i += 1;
                }
                (Some(a), None) => {
                    indices.push(a);
                    values.push(self.values[i]);
                    i += 1;
                }
                (_, Some(b)) => {
                    indices.push(b);
                    values.push(alpha * other.values[j]);
                    j += 1;
                }
                (None, None) => break,
            }
        }

        Ok(SparseVector {
            dims: self.dims,
            indices,
            values,
        })
    }

    /// Grow dimensionality in place; stored entries are untouched
    ///
    /// # Errors
    ///
    /// Shrinking is rejected with `Error::InvalidOperation`.
    pub fn resize(&mut self, dims: usize) -> Result<()> {
        if dims < self.dims {
            return Err(Error::InvalidOperation(format!(
                "cannot shrink sparse vector from {} to {} dims",
                self.dims, dims
            )));
        }
        self.dims = dims;
        Ok(())
    }

    /// Expand to a dense buffer of length `dims()`
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.dims];
        for (i, v) in self.iter() {
            dense[i as usize] = v;
        }
        dense
    }
}

/// Check that `indices` is strictly increasing and below `dims`
pub(crate) fn validate_indices(dims: usize, indices: &[u32]) -> Result<()> {
    for pair in indices.windows(2) {
        if pair[0] >= pair[1] {
            return Err(Error::InvalidOperation(format!(
                "sparse indices must be strictly increasing, found {} then {}",
                pair[0], pair[1]
            )));
        }
    }
    if let Some(&last) = indices.last() {
        if last as usize >= dims {
            return Err(Error::DimensionMismatch {
                expected: dims,
                actual: last as usize + 1,
            });
        }
    }
    Ok(())
}
