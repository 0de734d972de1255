//! In-memory anchoring service for tests and offline runs

use std::collections::HashMap;

use async_trait::async_trait;
use credchain_merkle::{Digest, Keccak256Hasher};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    error::{AnchorError, Result},
    service::{AnchorReceipt, AnchorRequest, AnchorService, AnchoredEvent, EventQuery},
};

/// Mock anchoring service (no ledger involved)
///
/// Every anchored leaf becomes one event; each batch gets its own block.
#[derive(Debug, Default)]
pub struct MockAnchorService {
    inner: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    requests: Vec<AnchorRequest>,
    events: HashMap<String, Vec<AnchoredEvent>>,
    block_number: u64,
}

impl MockAnchorService {
    /// Create a new mock service
    pub fn new() -> Self {
        info!("Using mock anchoring service (nothing leaves this process)");
        Self::default()
    }

    /// Requests received so far, oldest first
    pub async fn requests(&self) -> Vec<AnchorRequest> {
        self.inner.lock().await.requests.clone()
    }

    /// Deterministic transaction hash for a request
    pub fn transaction_hash(request: &AnchorRequest) -> Digest {
        let mut preimage = String::new();
        preimage.push_str(&request.batch_id);
        preimage.push_str(&request.label);
        for leaf in &request.leaf_hashes {
            preimage.push_str(&leaf.to_hex());
        }
        Keccak256Hasher::hash(preimage.as_bytes())
    }
}

#[async_trait]
impl AnchorService for MockAnchorService {
    async fn anchor_batch(&self, request: &AnchorRequest) -> Result<AnchorReceipt> {
        let mut state = self.inner.lock().await;
        if state.events.contains_key(&request.batch_id) {
            return Err(AnchorError::AlreadyAnchored(request.batch_id.clone()));
        }

        state.block_number += 1;
        let block_number = state.block_number;
        let transaction_hash = Self::transaction_hash(request).to_hex();

        let events = request
            .leaf_hashes
            .iter()
            .map(|hash| AnchoredEvent {
                hash: *hash,
                block_number,
                transaction_hash: transaction_hash.clone(),
            })
            .collect();
        state.events.insert(request.batch_id.clone(), events);
        state.requests.push(request.clone());

        info!(batch_id = %request.batch_id, block_number, "Mock anchored batch");
        Ok(AnchorReceipt { transaction_hash })
    }
}

#[async_trait]
impl EventQuery for MockAnchorService {
    async fn anchored_events(&self, batch_id: &str) -> Result<Vec<AnchoredEvent>> {
        Ok(self
            .inner
            .lock()
            .await
            .events
            .get(batch_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(batch_id: &str, n: usize) -> AnchorRequest {
        AnchorRequest {
            batch_id: batch_id.into(),
            label: "Master 2025".into(),
            leaf_hashes: (0..n)
                .map(|i| Keccak256Hasher::hash(format!("leaf-{i}").as_bytes()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_anchor_then_query() {
        let service = MockAnchorService::new();
        let req = request("b-1", 3);

        let receipt = service.anchor_batch(&req).await.unwrap();
        assert_eq!(
            receipt.transaction_hash,
            MockAnchorService::transaction_hash(&req).to_hex()
        );

        let events = service.anchored_events("b-1").await.unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.block_number == 1));
        assert_eq!(events[2].hash, req.leaf_hashes[2]);
        assert_eq!(service.requests().await, vec![req]);
    }

    #[tokio::test]
    async fn test_blocks_increase() {
        let service = MockAnchorService::new();
        service.anchor_batch(&request("b-1", 1)).await.unwrap();
        service.anchor_batch(&request("b-2", 1)).await.unwrap();

        let events = service.anchored_events("b-2").await.unwrap();
        assert_eq!(events[0].block_number, 2);
    }

    #[tokio::test]
    async fn test_rejects_duplicate_batch() {
        let service = MockAnchorService::new();
        service.anchor_batch(&request("b-1", 2)).await.unwrap();
        let err = service.anchor_batch(&request("b-1", 2)).await.unwrap_err();
        assert!(matches!(err, AnchorError::AlreadyAnchored(id) if id == "b-1"));
    }

    #[tokio::test]
    async fn test_unknown_batch_has_no_events() {
        let service = MockAnchorService::new();
        assert!(service.anchored_events("nope").await.unwrap().is_empty());
    }
}
