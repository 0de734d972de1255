//! Error types for the anchoring boundary

use credchain_merkle::MerkleError;
use thiserror::Error;

/// Errors from preparing, submitting or querying anchored batches
#[derive(Debug, Error)]
pub enum AnchorError {
    /// Record hashing or proof handling failed
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// Transport failure talking to the anchoring service
    #[error("anchoring service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured service URL cannot be used as a base for requests
    #[error("invalid anchoring service URL {0}")]
    InvalidUrl(String),

    /// The anchoring service answered with a non-success status
    #[error("anchoring service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// A batch without records has no root to anchor
    #[error("batch {0} has no records")]
    EmptyBatch(String),

    /// The batch id was already anchored
    #[error("batch {0} is already anchored")]
    AlreadyAnchored(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AnchorError>;
