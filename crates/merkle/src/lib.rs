//! Merkle commitments over diploma records
//!
//! This crate turns an ordered batch of student records into a single root
//! digest that can be anchored on chain, and lets anyone check one record's
//! inclusion against that root with nothing but the leaf digest and a short
//! proof.
//! - Keccak-256, digests rendered as `0x` + lower-case hex
//! - Unpaired nodes are carried up, never hashed with themselves
//! - Proofs are portable JSON: `[{"hash": "0x…", "position": "left"|"right"}]`

mod digest;
mod error;
mod hasher;
mod proof;
mod record;
mod tree;

pub use digest::{DIGEST_HEX_LEN, DIGEST_PREFIX, Digest, EMPTY_ROOT};
pub use error::{MerkleError, Result};
pub use hasher::{Keccak256Hasher, hash_pair, hash_record, keccak256};
pub use proof::{Position, Proof, ProofStep, verify, verify_hex};
pub use record::{
    CANONICAL_FORMAT_VERSION, CanonicalRecord, DiplomaRef, IssuanceRecord, Record, RecordKind,
    StudentRecord,
};
pub use tree::MerkleTree;
