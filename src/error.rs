//! Errors raised by list traversal, replica operations and restores.

use crate::crdt::primitives::NodeId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reading or mutating a replica.
///
/// Mutating entry points roll the replica back before returning any of
/// these, so a caller never observes a half-applied operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identifier lookup missed the table.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// A positional walk ran off the end of the list.
    #[error("index out of bounds: {index} (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The caller passed arguments that cannot describe a valid mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A traversal revisited a node.
    #[error("cycle detected at {0}")]
    CycleDetected(NodeId),

    /// A restored structure breaks a list invariant.
    #[error("inconsistent list: {0}")]
    Inconsistent(String),

    /// A serialized payload could not be decoded.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}
