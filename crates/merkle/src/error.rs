//! Error types for hashing, tree queries and proof checking

use thiserror::Error;

/// Errors raised by the Merkle engine.
///
/// All of them describe malformed input; the engine performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// A record is missing a field, or a value is not a well-formed digest.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A proof was requested for a leaf the tree does not have.
    #[error("leaf index {index} out of range (tree has {leaf_count} leaves)")]
    IndexOutOfRange {
        /// Requested leaf index
        index: usize,
        /// Number of leaves in the tree
        leaf_count: usize,
    },

    /// A supplied proof has the wrong shape or an unknown position token.
    #[error("invalid Merkle proof ({0})")]
    MalformedProof(String),
}

impl MerkleError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn malformed_proof(msg: impl Into<String>) -> Self {
        Self::MalformedProof(msg.into())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MerkleError>;
