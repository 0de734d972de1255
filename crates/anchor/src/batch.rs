//! Preparing issuance batches for anchoring

use credchain_merkle::{CanonicalRecord, Digest, IssuanceRecord, MerkleTree, Proof, hash_record};
use tracing::{debug, info};

use crate::{
    error::{AnchorError, Result},
    service::{AnchorReceipt, AnchorRequest, AnchorService},
};

/// Hash `records` into leaves, yielding to the runtime between chunks.
///
/// The output is identical to hashing every record in one go; only the
/// scheduling differs. A `chunk_size` of zero is treated as one.
pub async fn hash_records_chunked<R>(records: &[R], chunk_size: usize) -> Vec<Digest>
where
    R: CanonicalRecord + Sync,
{
    let chunk_size = chunk_size.max(1);
    let mut leaves = Vec::with_capacity(records.len());
    for (i, chunk) in records.chunks(chunk_size).enumerate() {
        if i > 0 {
            tokio::task::yield_now().await;
        }
        leaves.extend(chunk.iter().map(hash_record));
    }
    debug!(leaves = leaves.len(), chunk_size, "hashed records");
    leaves
}

/// Issuance batch with its tree, ready to be anchored
#[derive(Clone, Debug)]
pub struct AnchorBatch {
    batch_id: String,
    label: String,
    records: Vec<IssuanceRecord>,
    tree: MerkleTree,
}

impl AnchorBatch {
    /// Build the tree over `records` in the given order
    pub fn prepare(
        batch_id: impl Into<String>,
        label: impl Into<String>,
        records: Vec<IssuanceRecord>,
    ) -> Result<Self> {
        let batch_id = batch_id.into();
        if records.is_empty() {
            return Err(AnchorError::EmptyBatch(batch_id));
        }
        let tree = MerkleTree::build(&records);
        Ok(Self::assemble(batch_id, label.into(), records, tree))
    }

    /// Same as [`Self::prepare`], hashing `chunk_size` records at a time
    pub async fn prepare_chunked(
        batch_id: impl Into<String>,
        label: impl Into<String>,
        records: Vec<IssuanceRecord>,
        chunk_size: usize,
    ) -> Result<Self> {
        let batch_id = batch_id.into();
        if records.is_empty() {
            return Err(AnchorError::EmptyBatch(batch_id));
        }
        let leaves = hash_records_chunked(&records, chunk_size).await;
        let tree = MerkleTree::from_leaves(leaves);
        Ok(Self::assemble(batch_id, label.into(), records, tree))
    }

    fn assemble(
        batch_id: String,
        label: String,
        records: Vec<IssuanceRecord>,
        tree: MerkleTree,
    ) -> Self {
        info!(
            batch_id = %batch_id,
            records = records.len(),
            root = %tree.root_hex(),
            "Prepared anchor batch"
        );
        Self {
            batch_id,
            label,
            records,
            tree,
        }
    }

    /// Batch identifier
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Batch label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Records in leaf order
    pub fn records(&self) -> &[IssuanceRecord] {
        &self.records
    }

    /// Tree over the records
    pub const fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// Root to be published
    pub fn root(&self) -> Option<Digest> {
        self.tree.root()
    }

    /// Leaf digests in record order
    pub fn leaf_hashes(&self) -> &[Digest] {
        self.tree.leaves()
    }

    /// Inclusion proof for the record at `index`
    pub fn proof(&self, index: usize) -> Result<Proof> {
        Ok(self.tree.proof(index)?)
    }

    /// Index and proof of the first record issued to `student_id`
    pub fn proof_for_student(&self, student_id: &str) -> Option<(usize, Proof)> {
        let index = self
            .records
            .iter()
            .position(|record| record.student_id == student_id)?;
        self.tree.proof(index).ok().map(|proof| (index, proof))
    }

    /// Request body for the anchoring service
    pub fn request(&self) -> AnchorRequest {
        AnchorRequest {
            batch_id: self.batch_id.clone(),
            label: self.label.clone(),
            leaf_hashes: self.leaf_hashes().to_vec(),
        }
    }

    /// Submit the batch through `service`
    pub async fn submit<S>(&self, service: &S) -> Result<AnchorReceipt>
    where
        S: AnchorService + ?Sized,
    {
        service.anchor_batch(&self.request()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mock::MockAnchorService,
        service::{EventQuery, confirm_inclusion},
    };
    use credchain_merkle::verify;

    fn records(n: usize) -> Vec<IssuanceRecord> {
        (0..n)
            .map(|i| IssuanceRecord::new(format!("S{i:03}"), "42", "Master Informatique"))
            .collect()
    }

    #[tokio::test]
    async fn test_chunking_does_not_change_leaves() {
        let records = records(37);
        let expected: Vec<Digest> = records.iter().map(hash_record).collect();
        for chunk_size in [0, 1, 2, 5, 36, 37, 100] {
            assert_eq!(hash_records_chunked(&records, chunk_size).await, expected);
        }
    }

    #[tokio::test]
    async fn test_prepare_chunked_matches_prepare() {
        let sync = AnchorBatch::prepare("b", "l", records(9)).unwrap();
        let chunked = AnchorBatch::prepare_chunked("b", "l", records(9), 4).await.unwrap();
        assert_eq!(sync.root(), chunked.root());
        assert_eq!(sync.tree(), chunked.tree());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = AnchorBatch::prepare("b-0", "empty", Vec::new()).unwrap_err();
        assert!(matches!(err, AnchorError::EmptyBatch(id) if id == "b-0"));
    }

    #[test]
    fn test_request_and_proofs() {
        let batch = AnchorBatch::prepare("promo-2025", "Master 2025", records(5)).unwrap();
        let request = batch.request();
        assert_eq!(request.batch_id, "promo-2025");
        assert_eq!(request.leaf_hashes, batch.leaf_hashes());

        let (index, proof) = batch.proof_for_student("S003").unwrap();
        assert_eq!(index, 3);
        assert!(verify(&batch.leaf_hashes()[3], &proof, &batch.root().unwrap()));
        assert!(batch.proof_for_student("S999").is_none());
        assert!(batch.proof(5).is_err());
    }

    #[tokio::test]
    async fn test_submit_and_confirm() {
        let service = MockAnchorService::new();
        let batch = AnchorBatch::prepare("promo-2025", "Master 2025", records(4)).unwrap();

        let receipt = batch.submit(&service).await.unwrap();
        let events = service.anchored_events(batch.batch_id()).await.unwrap();

        let (index, proof) = batch.proof_for_student("S002").unwrap();
        let event = confirm_inclusion(&events, &batch.leaf_hashes()[index], &proof).unwrap();
        assert_eq!(event.transaction_hash, receipt.transaction_hash);
    }
}
