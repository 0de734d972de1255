//! Interfaces of the external anchoring and event-query services

use async_trait::async_trait;
use credchain_merkle::{Digest, Proof};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Batch submitted for anchoring
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRequest {
    /// Caller-chosen batch identifier
    pub batch_id: String,
    /// Human readable label (diploma, promotion…)
    pub label: String,
    /// Leaf digests in tree order
    pub leaf_hashes: Vec<Digest>,
}

/// Reference returned once a batch is submitted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorReceipt {
    /// Transaction carrying the batch
    pub transaction_hash: String,
}

/// On-chain confirmation of a root or leaf digest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchoredEvent {
    /// Root or leaf digest that was recorded
    pub hash: Digest,
    /// Block in which it was recorded
    pub block_number: u64,
    /// Transaction that recorded it
    pub transaction_hash: String,
}

/// Service that publishes batches of leaf digests to a ledger
#[async_trait]
pub trait AnchorService: Send + Sync {
    /// Submit a batch and return its transaction reference
    async fn anchor_batch(&self, request: &AnchorRequest) -> Result<AnchorReceipt>;
}

/// Service that reports what a ledger has confirmed
#[async_trait]
pub trait EventQuery: Send + Sync {
    /// Confirmed digests for a batch, oldest first
    async fn anchored_events(&self, batch_id: &str) -> Result<Vec<AnchoredEvent>>;
}

/// Find the event confirming `leaf`.
///
/// An event matches when it recorded the leaf itself, or a root that `proof`
/// folds the leaf up to.
pub fn confirm_inclusion<'a>(
    events: &'a [AnchoredEvent],
    leaf: &Digest,
    proof: &Proof,
) -> Option<&'a AnchoredEvent> {
    let root = proof.compute_root(leaf);
    events
        .iter()
        .find(|event| event.hash == *leaf || event.hash == root)
}
