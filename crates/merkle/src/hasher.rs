//! Keccak256 hashing of records and digest pairs

use tiny_keccak::{Hasher, Keccak};

use crate::{
    digest::{DIGEST_HEX_LEN, Digest},
    error::Result,
    record::CanonicalRecord,
};

/// Keccak-256 over raw bytes.
///
/// The only place the hash algorithm is named; everything else in the crate
/// goes through this function.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Keccak256 hasher for leaves and interior nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash a single value
    pub fn hash(data: &[u8]) -> Digest {
        Digest::new(keccak256(data))
    }

    /// Hash one record's canonical serialization into a leaf
    pub fn hash_record<R: CanonicalRecord + ?Sized>(record: &R) -> Digest {
        Self::hash(record.canonical().as_bytes())
    }

    /// Hash two digests together.
    ///
    /// The input is the concatenation of both textual forms, prefixes
    /// included, with no separator.
    pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
        let mut text = String::with_capacity(2 * DIGEST_HEX_LEN);
        text.push_str(&left.to_hex());
        text.push_str(&right.to_hex());
        Self::hash(text.as_bytes())
    }

    /// [`Self::hash_pair`] over untrusted digest strings
    pub fn hash_pair_hex(left: &str, right: &str) -> Result<Digest> {
        let left = Digest::from_hex(left)?;
        let right = Digest::from_hex(right)?;
        Ok(Self::hash_pair(&left, &right))
    }
}

/// Leaf digest of a record
pub fn hash_record<R: CanonicalRecord + ?Sized>(record: &R) -> Digest {
    Keccak256Hasher::hash_record(record)
}

/// Parent digest of two children, left first
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    Keccak256Hasher::hash_pair(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, StudentRecord};

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            Keccak256Hasher::hash(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            Keccak256Hasher::hash(b"abc").to_hex(),
            "0x4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn test_hash_pair_is_text_concatenation() {
        let left = Keccak256Hasher::hash(b"left");
        let right = Keccak256Hasher::hash(b"right");

        let expected = Keccak256Hasher::hash(format!("{left}{right}").as_bytes());
        assert_eq!(hash_pair(&left, &right), expected);
    }

    #[test]
    fn test_hash_pair_order_matters() {
        let a = Keccak256Hasher::hash(b"a");
        let b = Keccak256Hasher::hash(b"b");
        assert_ne!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn test_hash_pair_hex_validates() {
        let a = Keccak256Hasher::hash(b"a");
        let b = Keccak256Hasher::hash(b"b");

        let via_text = Keccak256Hasher::hash_pair_hex(&a.to_hex(), &b.to_hex()).unwrap();
        assert_eq!(via_text, hash_pair(&a, &b));

        assert!(Keccak256Hasher::hash_pair_hex("not a digest", &b.to_hex()).is_err());
        assert!(Keccak256Hasher::hash_pair_hex(&a.to_hex(), "").is_err());
    }

    #[test]
    fn test_hash_record_uses_canonical_text() {
        let record = Record::Student(StudentRecord::new("Doe", "John", "ABC123"));
        let expected =
            Keccak256Hasher::hash(br#"{"nom":"Doe","prenom":"John","studentId":"ABC123"}"#);
        assert_eq!(hash_record(&record), expected);
    }
}
