//! Foundation types for Quarry.
//!
//! Every artifact in a Quarry repository is named by the hash of its
//! content. Two hash algorithms are recognized, distinguished purely by the
//! length of their hexadecimal rendering.
//!
//! # Key Types
//!
//! - [`HashAlgorithm`] -- SHA1 (40 hex digits) or SHA3-256 (64 hex digits)
//! - [`ArtifactId`] -- a content hash tagged with the algorithm that produced it
//! - [`validate_hash_name`] -- classify a byte string as a hash name

pub mod artifact;
pub mod error;
pub mod hash;

pub use artifact::ArtifactId;
pub use error::TypeError;
pub use hash::{validate_hash_name, HashAlgorithm};
