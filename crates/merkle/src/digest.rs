//! Digest type and its textual form

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{MerkleError, Result};

/// Prefix carried by every digest in its textual form
pub const DIGEST_PREFIX: &str = "0x";

/// Length of a digest string including the prefix
pub const DIGEST_HEX_LEN: usize = 2 + 64;

/// Root of an empty tree as it appears in textual output
pub const EMPTY_ROOT: &str = "";

/// 32-byte Keccak-256 digest.
///
/// The textual form is `0x` followed by 64 lower-case hex characters. That form
/// is also the input of [`hash_pair`](crate::hash_pair), so comparisons are
/// case and prefix sensitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw hash output
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse the canonical textual form.
    ///
    /// Upper-case hex and a missing prefix are rejected rather than normalized.
    pub fn from_hex(s: &str) -> Result<Self> {
        let Some(body) = s.strip_prefix(DIGEST_PREFIX) else {
            return Err(MerkleError::invalid_input(format!(
                "digest must start with {DIGEST_PREFIX}: {s:?}"
            )));
        };
        if s.len() != DIGEST_HEX_LEN {
            return Err(MerkleError::invalid_input(format!(
                "digest must be {DIGEST_HEX_LEN} characters, got {}",
                s.len()
            )));
        }
        if !body.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(MerkleError::invalid_input(format!(
                "digest must be lower-case hex: {s:?}"
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| MerkleError::invalid_input(format!("bad digest {s:?}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Canonical textual form
    pub fn to_hex(&self) -> String {
        format!("{DIGEST_PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(DIGEST_PREFIX)?;
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl FromStr for Digest {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8; 32]> for Digest {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
