//! Binary Merkle tree over an ordered list of leaves

use crate::{
    digest::{Digest, EMPTY_ROOT},
    error::{MerkleError, Result},
    hasher::{hash_pair, hash_record},
    proof::{Position, Proof, ProofStep},
    record::CanonicalRecord,
};

/// Merkle tree with every level kept.
///
/// Level 0 holds the leaves in input order. Each further level pairs adjacent
/// digests left to right with [`hash_pair`]; an unpaired last digest is
/// carried up unchanged, never hashed with itself. The last level holds the
/// root. An empty tree has no levels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Hash `records` into leaves and build the tree over them
    pub fn build<R: CanonicalRecord>(records: &[R]) -> Self {
        Self::from_leaves(records.iter().map(hash_record).collect())
    }

    /// Build the tree over already computed leaf digests
    pub fn from_leaves(leaves: Vec<Digest>) -> Self {
        if leaves.is_empty() {
            return Self::default();
        }

        let mut levels = vec![leaves];
        while let Some(top) = levels.last().filter(|level| level.len() > 1) {
            let next = Self::next_level(top);
            levels.push(next);
        }

        tracing::debug!(
            leaves = levels[0].len(),
            height = levels.len(),
            "built merkle tree"
        );
        Self { levels }
    }

    fn next_level(level: &[Digest]) -> Vec<Digest> {
        level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hash_pair(left, right),
                // odd one out is promoted as is
                _ => pair[0],
            })
            .collect()
    }

    /// Root digest, `None` for an empty tree
    pub fn root(&self) -> Option<Digest> {
        self.levels.last().and_then(|top| top.first()).copied()
    }

    /// Root in textual form, [`EMPTY_ROOT`] for an empty tree
    pub fn root_hex(&self) -> String {
        self.root()
            .map_or_else(|| EMPTY_ROOT.to_string(), |root| root.to_hex())
    }

    /// Leaf digests in input order
    pub fn leaves(&self) -> &[Digest] {
        self.levels.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Leaf digest at `index`
    pub fn leaf(&self, index: usize) -> Option<&Digest> {
        self.leaves().get(index)
    }

    /// Index of the first leaf equal to `digest`
    pub fn position_of(&self, digest: &Digest) -> Option<usize> {
        self.leaves().iter().position(|leaf| leaf == digest)
    }

    /// All levels, leaves first
    pub fn levels(&self) -> &[Vec<Digest>] {
        &self.levels
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Number of levels, zero for an empty tree
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// `true` when built from no records
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Inclusion proof for the leaf at `index`.
    ///
    /// A level where the walked node has no sibling contributes no step.
    pub fn proof(&self, index: usize) -> Result<Proof> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(MerkleError::IndexOutOfRange { index, leaf_count });
        }
        let Some((_root, below_root)) = self.levels.split_last() else {
            return Err(MerkleError::IndexOutOfRange { index, leaf_count });
        };

        let mut steps = Vec::with_capacity(below_root.len());
        let mut index = index;
        for level in below_root {
            if let Some(hash) = level.get(index ^ 1) {
                let position = if index % 2 == 0 {
                    Position::Right
                } else {
                    Position::Left
                };
                steps.push(ProofStep {
                    hash: *hash,
                    position,
                });
            }
            index /= 2;
        }

        Ok(Proof::new(steps))
    }

    /// Proofs for every leaf, in leaf order
    pub fn proofs(&self) -> Vec<Proof> {
        (0..self.leaf_count())
            .filter_map(|index| self.proof(index).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hasher::Keccak256Hasher,
        proof::verify,
        record::{IssuanceRecord, StudentRecord},
    };

    fn leaves(n: usize) -> Vec<Digest> {
        (0..n)
            .map(|i| Keccak256Hasher::hash(format!("leaf-{i}").as_bytes()))
            .collect()
    }

    fn students() -> Vec<StudentRecord> {
        vec![
            StudentRecord::new("Doe", "John", "ABC123"),
            StudentRecord::new("Roe", "Jane", "XYZ789"),
        ]
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::build::<StudentRecord>(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.root_hex(), EMPTY_ROOT);
        assert_eq!(tree.height(), 0);
        assert!(tree.leaves().is_empty());
        assert!(tree.proofs().is_empty());
        assert_eq!(
            tree.proof(0),
            Err(MerkleError::IndexOutOfRange {
                index: 0,
                leaf_count: 0,
            })
        );
    }

    #[test]
    fn test_single_record() {
        let record = StudentRecord::new("Doe", "John", "ABC123");
        let tree = MerkleTree::build(std::slice::from_ref(&record));

        assert_eq!(tree.root(), Some(hash_record(&record)));
        assert_eq!(tree.height(), 1);
        assert!(tree.proof(0).unwrap().is_empty());
    }

    #[test]
    fn test_two_students() {
        let records = students();
        let tree = MerkleTree::build(&records);

        let h1 = hash_record(&records[0]);
        let h2 = hash_record(&records[1]);
        let root = hash_pair(&h1, &h2);

        assert_eq!(tree.leaves(), &[h1, h2]);
        assert_eq!(tree.root(), Some(root));

        let proof0 = tree.proof(0).unwrap();
        assert_eq!(
            proof0.steps(),
            &[ProofStep {
                hash: h2,
                position: Position::Right,
            }]
        );
        let proof1 = tree.proof(1).unwrap();
        assert_eq!(
            proof1.steps(),
            &[ProofStep {
                hash: h1,
                position: Position::Left,
            }]
        );

        assert!(verify(&h1, &proof0, &root));
        assert!(verify(&h2, &proof1, &root));
        assert!(!verify(&h1, &proof1, &root));
    }

    #[test]
    fn test_odd_leaf_is_carried() {
        let leaves = leaves(3);
        let (a, b, c) = (leaves[0], leaves[1], leaves[2]);
        let tree = MerkleTree::from_leaves(leaves);

        let ab = hash_pair(&a, &b);
        assert_eq!(tree.levels()[1], vec![ab, c]);
        assert_eq!(tree.root(), Some(hash_pair(&ab, &c)));
        assert_ne!(tree.root(), Some(hash_pair(&ab, &hash_pair(&c, &c))));

        // c has no sibling on level 0
        let proof = tree.proof(2).unwrap();
        assert_eq!(
            proof.steps(),
            &[ProofStep {
                hash: ab,
                position: Position::Left,
            }]
        );
    }

    #[test]
    fn test_level_sizes() {
        for n in 1..=33 {
            let tree = MerkleTree::from_leaves(leaves(n));
            let levels = tree.levels();
            for pair in levels.windows(2) {
                assert_eq!(pair[1].len(), pair[0].len().div_ceil(2));
            }
            assert_eq!(levels.last().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_every_proof_verifies() {
        for n in 1..=17 {
            let tree = MerkleTree::from_leaves(leaves(n));
            let root = tree.root().unwrap();
            for (i, proof) in tree.proofs().iter().enumerate() {
                assert!(proof.len() < tree.height());
                assert!(verify(&tree.leaves()[i], proof, &root), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn test_proof_out_of_range() {
        let tree = MerkleTree::from_leaves(leaves(5));
        assert_eq!(
            tree.proof(5),
            Err(MerkleError::IndexOutOfRange {
                index: 5,
                leaf_count: 5,
            })
        );
        assert!(tree.proof(usize::MAX).is_err());
    }

    #[test]
    fn test_order_sensitive() {
        let mut records = students();
        let root = MerkleTree::build(&records).root();
        records.swap(0, 1);
        assert_ne!(MerkleTree::build(&records).root(), root);
    }

    #[test]
    fn test_leaf_formats_differ() {
        let student = MerkleTree::build(&[StudentRecord::new("Doe", "John", "ABC123")]);
        let issuance = MerkleTree::build(&[IssuanceRecord::new("ABC123", "1", "Licence")]);
        assert_ne!(student.root(), issuance.root());
    }

    #[test]
    fn test_position_of() {
        let leaves = leaves(4);
        let tree = MerkleTree::from_leaves(leaves.clone());
        assert_eq!(tree.position_of(&leaves[2]), Some(2));
        assert_eq!(tree.leaf(2), Some(&leaves[2]));
        assert_eq!(tree.position_of(&Keccak256Hasher::hash(b"missing")), None);
    }
}
