//! Error types for duelrank
//!
//! This module defines all error types used throughout the workspace.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for duelrank operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for training, ranking and persistence
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (checkpoint and config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Rejected configuration value (raised at construction, never mid-training)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Feature and label maps disagree on their query ids
    #[error(
        "Query id mismatch: {} ids without labels, {} ids without features (e.g. {example})",
        missing_labels.len(),
        missing_features.len()
    )]
    KeySetMismatch {
        /// Ids present in the feature map only
        missing_labels: Vec<String>,
        /// Ids present in the label map only
        missing_features: Vec<String>,
        /// One offending id, for the message
        example: String,
    },

    /// Vector or matrix dimensionality does not line up
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality the operation required
        expected: usize,
        /// Dimensionality it was given
        actual: usize,
    },

    /// Two parallel sequences have different lengths
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// What was being compared
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Random direction had zero norm on every draw
    #[error("Degenerate direction: {0}")]
    DegenerateDirection(String),

    /// A shard worker failed; the whole mixture round is aborted
    #[error("Shard {shard} failed: {source}")]
    ShardFailed {
        /// Index of the failing shard
        shard: usize,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Checkpoint data failed validation
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// No checkpoint for the requested epoch
    #[error("Checkpoint not found for epoch {epoch}")]
    CheckpointNotFound {
        /// Requested epoch
        epoch: u64,
    },
}

impl Error {
    /// Wrap an error raised inside shard `shard`
    pub fn shard_failed(shard: usize, source: Error) -> Self {
        Error::ShardFailed {
            shard,
            source: Box::new(source),
        }
    }
}
