//! Compression envelope for Quarry artifacts.
//!
//! An envelope is a 4-byte big-endian length of the uncompressed content
//! followed by a zlib stream. The format is shared with existing
//! repositories, so the header width and byte order are fixed.

pub mod envelope;
pub mod error;

pub use envelope::{
    compress, compress_concat, declared_len, decompress, decompress_in_place, decompress_into,
    HEADER_LEN,
};
pub use error::{CompressError, CompressResult};
