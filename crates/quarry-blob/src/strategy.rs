//! Reallocation strategy: how a blob's backing store grows and shrinks.
//!
//! There are exactly two strategies. An owned store is a heap allocation the
//! blob frees on reset. A borrowed store references bytes the blob does not
//! own; the first request to resize it allocates owned storage, copies the
//! live bytes over and switches the blob to the owned strategy for good.
//!
//! Every operation that may change the size of a backing store goes through
//! [`Blob::realloc`](crate::Blob), so owned and borrowed blobs are
//! interchangeable to callers.

use crate::blob::Blob;
use crate::fatal;

/// Hard ceiling on the size of any backing store, in bytes.
///
/// Requests at or above this size are fatal. Sizes elsewhere in the system
/// are assumed to fit comfortably in a signed 32-bit integer.
pub const MAX_BLOB_SIZE: usize = 0x7FFF_0000;

/// An owned store is only shrunk when it would release more than this.
pub(crate) const SHRINK_SLACK: usize = 4000;

/// Backing store of the canonical empty blob: zero live bytes, room for a
/// terminator.
pub(crate) const EMPTY: &[u8] = b"\0";

/// Which strategy currently governs a blob's backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrowthStrategy {
    /// Heap storage owned by the blob.
    Owned,
    /// Bytes owned by someone else: a constant, or another blob.
    Borrowed,
}

#[derive(Clone)]
pub(crate) enum Storage<'a> {
    Borrowed(&'a [u8]),
    /// Fully initialized; `len()` is the capacity.
    Owned(Vec<u8>),
}

impl<'a> Storage<'a> {
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            Self::Borrowed(s) => s,
            Self::Owned(v) => v,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.bytes().len()
    }

    pub(crate) fn strategy(&self) -> GrowthStrategy {
        match self {
            Self::Borrowed(_) => GrowthStrategy::Borrowed,
            Self::Owned(_) => GrowthStrategy::Owned,
        }
    }
}

/// Abort if `size` is at or above [`MAX_BLOB_SIZE`].
#[track_caller]
pub(crate) fn check_ceiling(size: usize, operation: &str) {
    if size >= MAX_BLOB_SIZE {
        fatal!(
            "{operation}: a blob of {size} bytes would reach the {MAX_BLOB_SIZE}-byte size limit"
        );
    }
}

/// Allocate `size` zeroed bytes, aborting on exhaustion.
pub(crate) fn alloc_zeroed(size: usize) -> Vec<u8> {
    let mut store = Vec::new();
    grow_to(&mut store, size);
    store
}

fn grow_to(store: &mut Vec<u8>, size: usize) {
    let additional = size.saturating_sub(store.len());
    if store.try_reserve_exact(additional).is_err() {
        fatal!("out of memory: cannot allocate {size} bytes");
    }
    store.resize(size, 0);
}

impl<'a> Blob<'a> {
    /// Change the capacity of the backing store to `new_size`, dispatching on
    /// the current strategy. A size of zero returns the blob to the canonical
    /// empty state.
    pub(crate) fn realloc(&mut self, new_size: usize) {
        check_ceiling(new_size, "realloc");
        if new_size == 0 {
            self.storage = Storage::Borrowed(EMPTY);
            self.used = 0;
            self.cursor.set(0);
            return;
        }
        match &mut self.storage {
            Storage::Owned(store) => {
                let capacity = store.len();
                if new_size > capacity {
                    grow_to(store, new_size);
                } else if new_size + SHRINK_SLACK < capacity {
                    store.truncate(new_size);
                    store.shrink_to_fit();
                }
            }
            Storage::Borrowed(src) => {
                let keep = self.used.min(new_size);
                let mut store = alloc_zeroed(new_size);
                store[..keep].copy_from_slice(&src[..keep]);
                self.storage = Storage::Owned(store);
            }
        }
        let capacity = self.storage.capacity();
        if self.used > capacity {
            self.set_used(capacity);
        }
    }

    /// Owned backing store, for in-place writes. Callers establish ownership
    /// first; reaching the borrowed arm is a broken invariant.
    pub(crate) fn owned_store(&mut self) -> &mut Vec<u8> {
        match &mut self.storage {
            Storage::Owned(store) => store,
            Storage::Borrowed(_) => fatal!("attempt to write into borrowed blob storage"),
        }
    }
}
