//! Training data types
//!
//! - QueryId: opaque query key
//! - FeatureMatrix: CSR matrix of candidate documents for one query
//! - RelevanceVector: one judgment per candidate document
//! - Query: features paired with their judgments
//! - TrainingSet: every query, keyed by id

use crate::error::{Error, Result};
use crate::sparse::{validate_indices, SparseRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ============================================================================
// QueryId
// ============================================================================

/// Opaque query identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueryId(String);

impl QueryId {
    /// Create a query id
    pub fn new(id: impl Into<String>) -> Self {
        QueryId(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryId {
    fn from(s: &str) -> Self {
        QueryId(s.to_string())
    }
}

impl From<String> for QueryId {
    fn from(s: String) -> Self {
        QueryId(s)
    }
}

// ============================================================================
// FeatureMatrix
// ============================================================================

/// Compressed sparse row matrix: one row per candidate document
///
/// Deserialization runs the same checks as [`FeatureMatrix::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureMatrix")]
pub struct FeatureMatrix {
    dims: usize,
    data: Vec<f32>,
    indices: Vec<u32>,
    indptr: Vec<usize>,
}

/// Unvalidated wire form of a `FeatureMatrix`
#[derive(Deserialize)]
struct RawFeatureMatrix {
    dims: usize,
    data: Vec<f32>,
    indices: Vec<u32>,
    indptr: Vec<usize>,
}

impl TryFrom<RawFeatureMatrix> for FeatureMatrix {
    type Error = Error;

    fn try_from(raw: RawFeatureMatrix) -> Result<Self> {
        FeatureMatrix::new(raw.dims, raw.data, raw.indices, raw.indptr)
    }
}

impl FeatureMatrix {
    /// Build from raw CSR arrays
    ///
    /// # Errors
    ///
    /// `indptr` must start at 0, be non-decreasing and end at `data.len()`;
    /// each row's indices must be strictly increasing and below `dims`.
    pub fn new(dims: usize, data: Vec<f32>, indices: Vec<u32>, indptr: Vec<usize>) -> Result<Self> {
        if data.len() != indices.len() {
            return Err(Error::LengthMismatch {
                what: "CSR data",
                expected: indices.len(),
                actual: data.len(),
            });
        }
        if indptr.first() != Some(&0) || indptr.last() != Some(&data.len()) {
            return Err(Error::InvalidOperation(format!(
                "indptr must run from 0 to {}, got {:?}",
                data.len(),
                indptr
            )));
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidOperation(
                "indptr must be non-decreasing".to_string(),
            ));
        }
        for window in indptr.windows(2) {
            validate_indices(dims, &indices[window[0]..window[1]])?;
        }
        Ok(FeatureMatrix {
            dims,
            data,
            indices,
            indptr,
        })
    }

    /// Build from dense rows, dropping zeros
    ///
    /// # Errors
    ///
    /// Every row must have exactly `dims` entries.
    pub fn from_dense_rows<R: AsRef<[f32]>>(dims: usize, rows: &[R]) -> Result<Self> {
        let mut data = Vec::new();
        let mut indices = Vec::new();
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        indptr.push(0);

        for row in rows {
            let row = row.as_ref();
            if row.len() != dims {
                return Err(Error::DimensionMismatch {
                    expected: dims,
                    actual: row.len(),
                });
            }
            for (i, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    indices.push(i as u32);
                    data.push(v);
                }
            }
            indptr.push(data.len());
        }

        Ok(FeatureMatrix {
            dims,
            data,
            indices,
            indptr,
        })
    }

    /// Number of columns
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of candidate documents
    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Borrow row `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseRow::new(&self.indices[start..end], &self.data[start..end])
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_>> + '_ {
        (0..self.n_rows()).map(move |i| self.row(i))
    }
}

// ============================================================================
// RelevanceVector / Query
// ============================================================================

/// Relevance judgments, one per candidate; nonzero means relevant
pub type RelevanceVector = Vec<f32>;

/// One query's candidates and their judgments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery")]
pub struct Query {
    features: FeatureMatrix,
    labels: RelevanceVector,
}

/// Wire form of a `Query`; the label count is checked on conversion
#[derive(Deserialize)]
struct RawQuery {
    features: FeatureMatrix,
    labels: RelevanceVector,
}

impl TryFrom<RawQuery> for Query {
    type Error = Error;

    fn try_from(raw: RawQuery) -> Result<Self> {
        Query::new(raw.features, raw.labels)
    }
}

impl Query {
    /// Pair a feature matrix with its labels
    ///
    /// # Errors
    ///
    /// The label count must equal the matrix row count.
    pub fn new(features: FeatureMatrix, labels: RelevanceVector) -> Result<Self> {
        if features.n_rows() != labels.len() {
            return Err(Error::LengthMismatch {
                what: "relevance labels",
                expected: features.n_rows(),
                actual: labels.len(),
            });
        }
        Ok(Query { features, labels })
    }

    /// Candidate features
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// Candidate judgments
    pub fn labels(&self) -> &[f32] {
        &self.labels
    }
}

// ============================================================================
// TrainingSet
// ============================================================================

/// All training queries keyed by id, iterated in id order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    queries: BTreeMap<QueryId, Query>,
}

impl TrainingSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a feature map with a label map
    ///
    /// # Errors
    ///
    /// Returns `Error::KeySetMismatch` unless both maps hold exactly the
    /// same query ids; per-query shape errors propagate from [`Query::new`].
    pub fn from_maps(
        mut features: HashMap<QueryId, FeatureMatrix>,
        mut labels: HashMap<QueryId, RelevanceVector>,
    ) -> Result<Self> {
        let mut missing_labels: Vec<String> = features
            .keys()
            .filter(|id| !labels.contains_key(*id))
            .map(|id| id.to_string())
            .collect();
        let mut missing_features: Vec<String> = labels
            .keys()
            .filter(|id| !features.contains_key(*id))
            .map(|id| id.to_string())
            .collect();

        if !missing_labels.is_empty() || !missing_features.is_empty() {
            missing_labels.sort();
            missing_features.sort();
            let example = missing_labels
                .first()
                .or(missing_features.first())
                .cloned()
                .unwrap_or_default();
            return Err(Error::KeySetMismatch {
                missing_labels,
                missing_features,
                example,
            });
        }

        let mut queries = BTreeMap::new();
        for (id, matrix) in features.drain() {
            let judgments = labels.remove(&id).unwrap_or_default();
            queries.insert(id, Query::new(matrix, judgments)?);
        }
        Ok(TrainingSet { queries })
    }

    /// Add or replace one query
    pub fn insert(&mut self, id: impl Into<QueryId>, query: Query) {
        self.queries.insert(id.into(), query);
    }

    /// Look up a query
    pub fn get(&self, id: &QueryId) -> Option<&Query> {
        self.queries.get(id)
    }

    /// Number of queries
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// True when there are no queries
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Query ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &QueryId> + '_ {
        self.queries.keys()
    }

    /// Queries in id order
    pub fn iter(&self) -> impl Iterator<Item = (&QueryId, &Query)> + '_ {
        self.queries.iter()
    }

    /// Widest feature matrix (0 for an empty set)
    pub fn max_dims(&self) -> usize {
        self.queries
            .values()
            .map(|q| q.features().dims())
            .max()
            .unwrap_or(0)
    }
}
