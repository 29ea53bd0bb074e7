//! Core types for duelrank
//!
//! This crate defines the foundational types used throughout the workspace:
//! - SparseVector / SparseRow: sorted-index sparse vectors
//! - WeightVector: the trained ranking weight and its epoch counter
//! - FeatureMatrix, RelevanceVector, Query: one query's training data
//! - TrainingSet: all queries keyed by QueryId
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod sparse;
pub mod weight;

pub use error::{Error, Result};
pub use query::{FeatureMatrix, Query, QueryId, RelevanceVector, TrainingSet};
pub use sparse::{SparseRow, SparseVector};
pub use weight::{WeightVector, DEFAULT_DIMS};
