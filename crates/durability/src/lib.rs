//! Weight persistence for duelrank
//!
//! This crate provides:
//! - A versioned, CRC-checked binary encoding of a weight vector's CSR triple
//! - `CheckpointStore`: crash-safe, epoch-tagged checkpoint files

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod format;

pub use checkpoint::{CheckpointStore, CHECKPOINT_EXTENSION};
pub use format::{
    decode_weight, encode_weight, CHECKPOINT_FORMAT_VERSION, CHECKPOINT_HEADER_SIZE,
    CHECKPOINT_MAGIC,
};
