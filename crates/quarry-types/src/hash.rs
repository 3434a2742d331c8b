use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha3::Sha3_256;

/// A hash algorithm used to name artifacts.
///
/// The algorithm of a hash name is recoverable from its length alone, so
/// names never carry an explicit algorithm prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA1, 20-byte digest, 40 hex digits.
    #[serde(rename = "sha1")]
    Sha1,
    /// SHA3-256, 32-byte digest, 64 hex digits.
    #[serde(rename = "sha3-256")]
    Sha3_256,
}

impl HashAlgorithm {
    /// Size of the raw digest in bytes.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha3_256 => 32,
        }
    }

    /// Length of the hexadecimal hash name.
    pub const fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// Identify the algorithm whose hex names have `len` digits.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha3_256),
            _ => None,
        }
    }

    /// Short lowercase name, as used in settings and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha3_256 => "sha3-256",
        }
    }

    /// Compute the raw digest of `data`.
    pub(crate) fn digest(&self, data: &[u8], out: &mut [u8; 32]) {
        match self {
            Self::Sha1 => {
                let digest = Sha1::digest(data);
                out[..20].copy_from_slice(&digest);
            }
            Self::Sha3_256 => {
                let digest = Sha3_256::digest(data);
                out.copy_from_slice(&digest);
            }
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha3_256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify `name` as a hash name.
///
/// Returns the matching algorithm when `name` is exactly 40 or 64 hex
/// digits (either case), `None` otherwise.
pub fn validate_hash_name(name: &[u8]) -> Option<HashAlgorithm> {
    let algorithm = HashAlgorithm::from_hex_len(name.len())?;
    if name.iter().all(u8::is_ascii_hexdigit) {
        Some(algorithm)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        assert_eq!(HashAlgorithm::Sha1.hex_len(), 40);
        assert_eq!(HashAlgorithm::Sha3_256.hex_len(), 64);
        assert_eq!(HashAlgorithm::from_hex_len(40), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::from_hex_len(64), Some(HashAlgorithm::Sha3_256));
        assert_eq!(HashAlgorithm::from_hex_len(41), None);
    }

    #[test]
    fn validate_sha1_name() {
        let name = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
        assert_eq!(validate_hash_name(name.as_bytes()), Some(HashAlgorithm::Sha1));
        let upper = name.to_uppercase();
        assert_eq!(validate_hash_name(upper.as_bytes()), Some(HashAlgorithm::Sha1));
    }

    #[test]
    fn validate_sha3_name() {
        let name = "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a";
        assert_eq!(validate_hash_name(name.as_bytes()), Some(HashAlgorithm::Sha3_256));
    }

    #[test]
    fn reject_non_hex_and_bad_length() {
        let mut name = b"da39a3ee5e6b4b0d3255bfef95601890afd80709".to_vec();
        name[7] = b'g';
        assert_eq!(validate_hash_name(&name), None);
        assert_eq!(validate_hash_name(b"abc"), None);
        assert_eq!(validate_hash_name(b""), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(HashAlgorithm::Sha1.to_string(), "sha1");
        assert_eq!(HashAlgorithm::Sha3_256.to_string(), "sha3-256");
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha3_256);
    }
}
