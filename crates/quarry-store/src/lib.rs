//! Content-addressed artifact storage for Quarry.
//!
//! Every artifact is stored as a compression envelope keyed by the hash of
//! its uncompressed content, so identical content is stored once and any
//! corruption is caught when the content is read back.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`DirContentStore`] -- one file per artifact under a sharded directory

pub mod config;
pub mod dir;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::StoreConfig;
pub use dir::DirContentStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
