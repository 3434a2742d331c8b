//! The byte buffer at the bottom of Quarry.
//!
//! Every subsystem that reads, parses, transforms or writes bytes does so
//! through a [`Blob`]: a length-tracked buffer with a read cursor that either
//! owns a heap allocation or borrows bytes it does not own.
//!
//! # Components
//!
//! - [`Blob`] -- the buffer itself: append, resize, compare, cursor extraction
//! - [`GrowthStrategy`] -- owned vs. borrowed backing store; borrowed buffers
//!   copy themselves into owned storage the first time they grow
//! - [`Output`] -- a sink that is either a blob or a direct byte channel
//! - [`charclass`] -- ASCII-only, locale-independent byte classification
//! - [`shell`] -- quoting of subprocess arguments for POSIX and Windows shells
//! - text transforms on [`Blob`]: CRLF conversion, CP1252 and UTF-16 to UTF-8
//!
//! # Invariants
//!
//! 1. `len() <= capacity()` at all times.
//! 2. The cursor always lies in `[0, len()]`.
//! 3. No backing store ever reaches [`MAX_BLOB_SIZE`]; a request that would is
//!    a fatal error, never a recoverable one.
//! 4. A view produced by the extraction family borrows its parent and cannot
//!    outlive it; growing or terminating a view copies it first, so a view
//!    never writes into its parent.

pub mod blob;
pub mod build;
pub mod charclass;
pub mod cursor;
pub mod fatal;
pub mod output;
pub mod shell;
pub mod strategy;
pub mod text;

pub use blob::{Blob, Whence};
pub use output::Output;
pub use shell::{defuse_filename_arg, ShellFlavor};
pub use strategy::{GrowthStrategy, MAX_BLOB_SIZE};
