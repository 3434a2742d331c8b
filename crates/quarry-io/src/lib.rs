//! File and stream adapters: the boundary where blobs become persisted bytes
//! and back.
//!
//! Reads replace a blob's content with the whole of a file or stream; writes
//! emit a blob's content unchanged. The conventional path `-` (or an empty
//! path) stands for standard input or output.

pub mod config;
pub mod error;
pub mod file;

pub use config::IoConfig;
pub use error::{IoError, IoResult};
pub use file::{read_file, read_stream, write_file, SymlinkPolicy};
