//! Inclusion proofs and their verification
//!
//! A proof is the list of sibling digests met while walking from a leaf to the
//! root, each tagged with the side the sibling sits on. Verification needs only
//! the leaf digest, the proof and the claimed root:
//!
//! ```text
//! current = leaf
//! for step in proof:
//!     left  => current = hash_pair(step.hash, current)
//!     right => current = hash_pair(current, step.hash)
//! valid = current == root
//! ```
//!
//! The portable form is a JSON array of `{"hash": "0x…", "position": "left"|"right"}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    digest::Digest,
    error::{MerkleError, Result},
    hasher::hash_pair,
};

/// Side of the running hash on which a sibling sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Sibling is hashed first
    Left,
    /// Sibling is hashed second
    Right,
}

impl Position {
    /// Returns the string representation of the position
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a position token
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One level of an inclusion proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling digest at this level
    pub hash: Digest,
    /// Where the sibling goes in the concatenation
    pub position: Position,
}

impl ProofStep {
    /// Apply this step to the running hash
    pub fn apply(&self, current: &Digest) -> Digest {
        match self.position {
            Position::Left => hash_pair(&self.hash, current),
            Position::Right => hash_pair(current, &self.hash),
        }
    }
}

/// Inclusion proof, ordered from the leaf level upward
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof {
    steps: Vec<ProofStep>,
}

impl Proof {
    /// Create a proof from its steps
    pub const fn new(steps: Vec<ProofStep>) -> Self {
        Self { steps }
    }

    /// Steps from leaf level to root level
    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` for the proof of a single-leaf tree
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over the steps
    pub fn iter(&self) -> std::slice::Iter<'_, ProofStep> {
        self.steps.iter()
    }

    /// Root obtained by folding the proof over `leaf`
    pub fn compute_root(&self, leaf: &Digest) -> Digest {
        self.steps.iter().fold(*leaf, |current, step| step.apply(&current))
    }

    /// Verify this proof for `leaf` against `root`
    pub fn verify(&self, leaf: &Digest, root: &Digest) -> bool {
        self.compute_root(leaf) == *root
    }

    /// Parse the portable JSON form.
    ///
    /// Fails with [`MerkleError::MalformedProof`] when the text is not a JSON
    /// array or when any entry lacks a valid `hash` or `position`.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|_| MerkleError::malformed_proof("expected JSON array"))?;
        Self::from_value(&value)
    }

    /// Parse an already decoded JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(MerkleError::malformed_proof("expected JSON array"));
        };

        let steps = items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_step(i, item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    /// Portable JSON value
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.steps
                .iter()
                .map(|step| {
                    json!({ "hash": step.hash.to_hex(), "position": step.position.as_str() })
                })
                .collect(),
        )
    }

    /// Portable JSON text
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl From<Vec<ProofStep>> for Proof {
    fn from(steps: Vec<ProofStep>) -> Self {
        Self::new(steps)
    }
}

impl<'a> IntoIterator for &'a Proof {
    type Item = &'a ProofStep;
    type IntoIter = std::slice::Iter<'a, ProofStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

fn parse_step(index: usize, item: &Value) -> Result<ProofStep> {
    let Value::Object(obj) = item else {
        return Err(MerkleError::malformed_proof(format!(
            "step {index} is not an object"
        )));
    };

    let hash = obj
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| MerkleError::malformed_proof(format!("step {index} has no hash string")))?;
    let hash = Digest::from_hex(hash)
        .map_err(|e| MerkleError::malformed_proof(format!("step {index}: {e}")))?;

    let position = obj.get("position").and_then(Value::as_str).ok_or_else(|| {
        MerkleError::malformed_proof(format!("step {index} has no position string"))
    })?;
    let position = Position::parse(position).ok_or_else(|| {
        MerkleError::malformed_proof(format!(
            "step {index} has unknown position {position:?}"
        ))
    })?;

    Ok(ProofStep { hash, position })
}

/// Check that `leaf` is included under `root`.
///
/// An empty proof is valid exactly when the leaf is the root.
pub fn verify(leaf: &Digest, proof: &Proof, root: &Digest) -> bool {
    proof.verify(leaf, root)
}

/// [`verify`] over untrusted text, as typed in by someone checking a diploma
pub fn verify_hex(leaf: &str, proof_json: &str, root: &str) -> Result<bool> {
    let leaf = Digest::from_hex(leaf)?;
    let root = Digest::from_hex(root)?;
    let proof = Proof::from_json(proof_json)?;

    let valid = proof.verify(&leaf, &root);
    tracing::debug!(%leaf, %root, steps = proof.len(), valid, "verified inclusion proof");
    Ok(valid)
}
