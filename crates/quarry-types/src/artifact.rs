use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::hash::HashAlgorithm;

/// Content-addressed identifier for an artifact.
///
/// An `ArtifactId` is the hash of an artifact's content under one of the
/// supported [`HashAlgorithm`]s. Identical content hashed with the same
/// algorithm always produces the same `ArtifactId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId {
    algorithm: HashAlgorithm,
    // SHA1 digests occupy the first 20 bytes; the tail stays zero.
    digest: [u8; 32],
}

impl ArtifactId {
    /// Hash `data` with `algorithm`.
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        let mut digest = [0u8; 32];
        algorithm.digest(data, &mut digest);
        Self { algorithm, digest }
    }

    /// Build an identifier from a raw digest.
    pub fn from_digest(algorithm: HashAlgorithm, raw: &[u8]) -> Result<Self, TypeError> {
        if raw.len() != algorithm.digest_len() {
            return Err(TypeError::InvalidLength {
                expected: algorithm.digest_len(),
                actual: raw.len(),
            });
        }
        let mut digest = [0u8; 32];
        digest[..raw.len()].copy_from_slice(raw);
        Ok(Self { algorithm, digest })
    }

    /// Parse a hex hash name. The algorithm is inferred from its length.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let algorithm =
            HashAlgorithm::from_hex_len(s.len()).ok_or(TypeError::UnknownHashLength(s.len()))?;
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_digest(algorithm, &bytes)
    }

    /// The algorithm that produced this identifier.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.digest[..self.algorithm.digest_len()]
    }

    /// Lowercase hex hash name.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Short hex representation (first 10 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.digest[..5])
    }

    /// Check that `data` hashes to this identifier.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute(self.algorithm, data) == *self
    }
}

impl fmt::Debug for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactId({}:{})", self.algorithm, self.short_hex())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for ArtifactId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ArtifactId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ArtifactId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_empty_digests() {
        let sha1 = ArtifactId::compute(HashAlgorithm::Sha1, b"");
        assert_eq!(sha1.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        let sha3 = ArtifactId::compute(HashAlgorithm::Sha3_256, b"");
        assert_eq!(
            sha3.to_hex(),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn compute_is_deterministic() {
        let a = ArtifactId::compute(HashAlgorithm::Sha3_256, b"hello world");
        let b = ArtifactId::compute(HashAlgorithm::Sha3_256, b"hello world");
        assert_eq!(a, b);
        assert!(a.verify(b"hello world"));
        assert!(!a.verify(b"hello world!"));
    }

    #[test]
    fn algorithms_differ() {
        let a = ArtifactId::compute(HashAlgorithm::Sha1, b"x");
        let b = ArtifactId::compute(HashAlgorithm::Sha3_256, b"x");
        assert_ne!(a, b);
        assert_eq!(a.as_bytes().len(), 20);
        assert_eq!(b.as_bytes().len(), 32);
    }

    #[test]
    fn from_hex_rejects_unknown_length() {
        let err = ArtifactId::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::UnknownHashLength(4));
    }

    #[test]
    fn from_hex_rejects_bad_digits() {
        let bad = "z".repeat(40);
        assert!(matches!(
            ArtifactId::from_hex(&bad),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn from_digest_checks_length() {
        let err = ArtifactId::from_digest(HashAlgorithm::Sha1, &[0u8; 32]).unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 20,
                actual: 32
            }
        );
    }

    #[test]
    fn serde_as_hex_string() {
        let id = ArtifactId::compute(HashAlgorithm::Sha1, b"serde");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let parsed: ArtifactId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn short_hex_is_10_chars() {
        let id = ArtifactId::compute(HashAlgorithm::Sha3_256, b"short");
        assert_eq!(id.short_hex().len(), 10);
        assert!(id.to_hex().starts_with(&id.short_hex()));
    }

    proptest! {
        #[test]
        fn hex_parse_recovers_id(data in proptest::collection::vec(any::<u8>(), 0..256), sha1 in any::<bool>()) {
            let algorithm = if sha1 { HashAlgorithm::Sha1 } else { HashAlgorithm::Sha3_256 };
            let id = ArtifactId::compute(algorithm, &data);
            let parsed: ArtifactId = id.to_hex().parse().unwrap();
            prop_assert_eq!(parsed, id);
            prop_assert_eq!(crate::validate_hash_name(id.to_hex().as_bytes()), Some(algorithm));
        }
    }
}
