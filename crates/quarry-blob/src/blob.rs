use std::borrow::Cow;
use std::cell::Cell;
use std::cmp::Ordering;
use std::ffi::CStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::ops::Range;

use quarry_types::{validate_hash_name, HashAlgorithm};

use crate::charclass::is_space;
use crate::fatal;
use crate::strategy::{check_ceiling, GrowthStrategy, Storage, EMPTY};

/// Set once the general formatter has written into the blob.
pub(crate) const FLAG_NOT_SQL: u8 = 0x01;

/// Extra room added on top of doubling when an append has to grow.
const APPEND_PAD: usize = 100;

/// Reference point for [`Blob::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whence {
    /// Offset from the start of the content.
    Set,
    /// Offset from the current cursor.
    Current,
}

/// A variable-length byte buffer with a read cursor.
///
/// A `Blob` either owns its storage or borrows bytes that live elsewhere
/// (a constant, or another blob via the extraction family). The lifetime
/// `'a` is the lifetime of borrowed bytes; owned blobs are `Blob<'static>`.
///
/// The cursor is read-side state used by [`line`](Blob::line),
/// [`token`](Blob::token), [`extract`](Blob::extract) and friends. It lives in
/// a [`Cell`] so that extraction works through a shared borrow: views into a
/// blob may coexist, and the borrow checker keeps the blob from being
/// modified while any of them is alive.
#[derive(Clone)]
pub struct Blob<'a> {
    pub(crate) storage: Storage<'a>,
    pub(crate) used: usize,
    pub(crate) cursor: Cell<usize>,
    pub(crate) flags: u8,
}

impl Blob<'static> {
    /// The canonical empty blob: no content, borrowed static storage with
    /// room for a terminator.
    pub const fn new() -> Self {
        Self {
            storage: Storage::Borrowed(EMPTY),
            used: 0,
            cursor: Cell::new(0),
            flags: 0,
        }
    }

    /// Take ownership of a heap allocation. An empty vector gives the
    /// canonical empty blob.
    pub fn from_vec(data: Vec<u8>) -> Self {
        if data.is_empty() {
            return Self::new();
        }
        check_ceiling(data.len(), "from_vec");
        let used = data.len();
        Self {
            storage: Storage::Owned(data),
            used,
            cursor: Cell::new(0),
            flags: 0,
        }
    }

    /// An empty owned blob with at least `capacity` bytes of storage.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut blob = Self::new();
        blob.reserve(capacity);
        blob
    }

    /// Allocate `n` empty blobs.
    pub fn array(n: usize) -> Vec<Self> {
        (0..n).map(|_| Self::new()).collect()
    }
}

impl<'a> Blob<'a> {
    /// Borrow `data` without copying. The blob never frees it.
    pub fn borrowed(data: &'a [u8]) -> Self {
        check_ceiling(data.len(), "borrowed");
        Self {
            storage: Storage::Borrowed(data),
            used: data.len(),
            cursor: Cell::new(0),
            flags: 0,
        }
    }

    /// Borrow the bytes of `data` up to (not including) its first NUL, or
    /// all of it when there is none.
    pub fn borrowed_until_nul(data: &'a [u8]) -> Self {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        Self::borrowed(&data[..len])
    }

    /// Re-initialize a reset blob to borrow `data`.
    ///
    /// Calling this on a blob that still holds content is a caller bug,
    /// caught in debug builds only.
    pub fn init_borrowed(&mut self, data: &'a [u8]) {
        debug_assert!(self.is_reset(), "init_borrowed on a blob that is not reset");
        *self = Self::borrowed(data);
    }

    /// Re-initialize a reset blob to own `data`.
    pub fn init_owned(&mut self, data: Vec<u8>) {
        debug_assert!(self.is_reset(), "init_owned on a blob that is not reset");
        *self = Blob::from_vec(data);
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    /// Number of live bytes.
    pub fn len(&self) -> usize {
        self.used
    }

    /// Returns `true` if the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Capacity of the backing store.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Strategy currently governing the backing store.
    pub fn strategy(&self) -> GrowthStrategy {
        self.storage.strategy()
    }

    /// Returns `true` if the blob is in the canonical empty state.
    pub fn is_reset(&self) -> bool {
        self.used == 0
            && self.cursor.get() == 0
            && matches!(self.storage, Storage::Borrowed(s) if s == EMPTY)
    }

    /// The live bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.bytes()[..self.used]
    }

    /// The live bytes, writable. Borrowed blobs are copied into owned
    /// storage first.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        if self.strategy() == GrowthStrategy::Borrowed {
            self.materialize();
        }
        let used = self.used;
        &mut self.owned_store()[..used]
    }

    /// The content decoded as UTF-8, with invalid sequences replaced.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Copy the content into a new owned blob.
    pub fn to_owned_blob(&self) -> Blob<'static> {
        let mut copy = Blob::new();
        copy.append(self.as_bytes());
        copy
    }

    /// Consume the blob and return its content as a vector.
    pub fn into_vec(self) -> Vec<u8> {
        let used = self.used;
        match self.storage {
            Storage::Owned(mut store) => {
                store.truncate(used);
                store
            }
            Storage::Borrowed(s) => s[..used].to_vec(),
        }
    }

    /// Set the live length, keeping the cursor in range.
    pub(crate) fn set_used(&mut self, used: usize) {
        self.used = used;
        if self.cursor.get() > used {
            self.cursor.set(used);
        }
    }

    /// Write the terminator one past the live bytes of an owned store.
    fn terminate_owned(&mut self) {
        let used = self.used;
        self.owned_store()[used] = 0;
    }

    // ---------------------------------------------------------------
    // Growth
    // ---------------------------------------------------------------

    /// Append `bytes`, growing the store with slack when needed. The byte
    /// past the new end is always a terminator afterwards.
    pub fn append(&mut self, bytes: &[u8]) {
        let needed = self.grow_for_append(bytes.len());
        let used = self.used;
        let store = self.owned_store();
        store[used..needed].copy_from_slice(bytes);
        store[needed] = 0;
        self.used = needed;
    }

    /// Append a single byte.
    pub fn append_char(&mut self, byte: u8) {
        if self.strategy() == GrowthStrategy::Owned && self.used + 1 < self.capacity() {
            let used = self.used;
            let store = self.owned_store();
            store[used] = byte;
            store[used + 1] = 0;
            self.used = used + 1;
        } else {
            self.append(&[byte]);
        }
    }

    /// Append `byte` `count` times.
    pub fn append_repeat(&mut self, byte: u8, count: usize) {
        let needed = self.grow_for_append(count);
        let used = self.used;
        let store = self.owned_store();
        store[used..needed].fill(byte);
        store[needed] = 0;
        self.used = needed;
    }

    /// Append a copy of part of the blob's own content. The source range is
    /// read as it was before the append began.
    pub fn append_from_self(&mut self, range: Range<usize>) {
        if range.start > range.end || range.end > self.used {
            fatal!(
                "append_from_self: range {}..{} outside blob of {} bytes",
                range.start,
                range.end,
                self.used
            );
        }
        let needed = self.grow_for_append(range.len());
        let used = self.used;
        let store = self.owned_store();
        store.copy_within(range, used);
        store[needed] = 0;
        self.used = needed;
    }

    /// Ensure owned storage with room for `extra` more bytes plus a
    /// terminator. Returns the new live length.
    fn grow_for_append(&mut self, extra: usize) -> usize {
        let needed = match self.used.checked_add(extra) {
            Some(n) => n,
            None => fatal!("append: blob length overflow"),
        };
        let capacity = self.capacity();
        if needed >= capacity || self.strategy() == GrowthStrategy::Borrowed {
            let target = needed
                .saturating_add(capacity)
                .saturating_add(APPEND_PAD);
            check_ceiling(target, "append");
            self.realloc(target);
        }
        needed
    }

    /// Set the live length to `new_len`, with capacity for exactly one
    /// terminator past it.
    pub fn resize(&mut self, new_len: usize) {
        check_ceiling(new_len.saturating_add(1), "resize");
        self.realloc(new_len + 1);
        self.set_used(new_len);
        self.terminate_owned();
    }

    /// Grow the capacity to at least `min_capacity` without changing the
    /// content. Never shrinks.
    pub fn reserve(&mut self, min_capacity: usize) {
        check_ceiling(min_capacity, "reserve");
        if min_capacity > self.capacity() {
            self.realloc(min_capacity);
            if self.used < self.capacity() {
                self.terminate_owned();
            }
        }
    }

    /// Force the blob into owned, terminated storage sized to its content.
    pub fn materialize(&mut self) {
        self.resize(self.used);
    }

    /// The content followed by a NUL terminator.
    ///
    /// Borrowed blobs are always copied into owned storage first, so
    /// terminating a view never writes into the bytes it borrows.
    pub fn terminated(&mut self) -> &[u8] {
        let has_room = match &self.storage {
            Storage::Borrowed(_) if self.used == 0 => return EMPTY,
            Storage::Borrowed(_) => false,
            Storage::Owned(store) => self.used < store.len(),
        };
        if has_room {
            self.terminate_owned();
        } else {
            self.materialize();
        }
        &self.storage.bytes()[..=self.used]
    }

    /// The content as a C string: everything up to the first NUL.
    pub fn as_c_str(&mut self) -> &CStr {
        CStr::from_bytes_until_nul(self.terminated()).unwrap_or_default()
    }

    // ---------------------------------------------------------------
    // Shrinking and lifecycle
    // ---------------------------------------------------------------

    /// Release owned storage and return to the canonical empty state.
    /// Resetting a borrowed or already empty blob only clears metadata.
    pub fn reset(&mut self) {
        self.realloc(0);
        self.flags = 0;
    }

    /// Reset every blob in `blobs`.
    pub fn reset_all(blobs: &mut [Blob<'_>]) {
        for blob in blobs {
            blob.reset();
        }
    }

    /// Shorten the content to `len` bytes. Lengths beyond the content are
    /// ignored. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len < self.used {
            self.set_used(len);
        }
    }

    /// Drop trailing whitespace by shortening the live length only. The
    /// terminator is not rewritten.
    pub fn trim(&mut self) {
        let bytes = self.as_bytes();
        let keep = bytes.iter().rposition(|&b| !is_space(b)).map_or(0, |i| i + 1);
        self.set_used(keep);
    }

    /// Exchange the contents of two blobs.
    pub fn swap(&mut self, other: &mut Blob<'a>) {
        std::mem::swap(self, other);
    }

    /// Replace the content with an independent copy of `src`.
    pub fn copy_from(&mut self, src: &Blob<'_>) {
        self.reset();
        self.append(src.as_bytes());
    }

    /// Append `src` then reset it.
    pub fn append_consume(&mut self, src: &mut Blob<'_>) {
        self.append(src.as_bytes());
        src.reset();
    }

    // ---------------------------------------------------------------
    // Comparison and inspection
    // ---------------------------------------------------------------

    /// Lexicographic comparison of the content; a proper prefix sorts first.
    pub fn compare(&self, other: &Blob<'_>) -> Ordering {
        let (a, b) = (self.as_bytes(), other.as_bytes());
        let n = a.len().min(b.len());
        match a[..n].cmp(&b[..n]) {
            Ordering::Equal => a.len().cmp(&b.len()),
            unequal => unequal,
        }
    }

    /// Compare content in time that depends only on the length.
    ///
    /// Returns `true` only when both blobs are non-empty, of equal length
    /// and byte-for-byte identical. Blobs of different length are rejected
    /// without reading their bytes; otherwise every byte is visited.
    pub fn constant_time_eq(&self, other: &Blob<'_>) -> bool {
        let (a, b) = (self.as_bytes(), other.as_bytes());
        if a.len() != b.len() || a.is_empty() {
            return false;
        }
        let mut diff = 0u8;
        for i in 0..a.len() {
            diff |= a[i] ^ b[i];
        }
        std::hint::black_box(diff) == 0
    }

    /// Returns `true` if the content equals `bytes`.
    pub fn eq_bytes(&self, bytes: &[u8]) -> bool {
        self.as_bytes() == bytes
    }

    /// Number of lines, counting a final line without a newline.
    pub fn line_count(&self) -> usize {
        let bytes = self.as_bytes();
        let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
        match bytes.last() {
            Some(&last) if last != b'\n' => newlines + 1,
            _ => newlines,
        }
    }

    /// Which hash algorithm, if any, the content names.
    pub fn is_hex_artifact_id(&self) -> Option<HashAlgorithm> {
        validate_hash_name(self.as_bytes())
    }

    /// Parse the entire content as a decimal integer with optional sign.
    pub fn parse_int(&self) -> Option<i64> {
        std::str::from_utf8(self.as_bytes()).ok()?.parse().ok()
    }

    // ---------------------------------------------------------------
    // Cursor
    // ---------------------------------------------------------------

    /// Current cursor position.
    pub fn tell(&self) -> usize {
        self.cursor.get()
    }

    /// Move the cursor, clamping it into `[0, len()]`. Returns the new
    /// position.
    pub fn seek(&self, offset: i64, whence: Whence) -> usize {
        let base = match whence {
            Whence::Set => 0,
            Whence::Current => self.cursor.get() as i64,
        };
        let target = base.saturating_add(offset).clamp(0, self.used as i64);
        self.cursor.set(target as usize);
        target as usize
    }

    /// Move the cursor back to the start.
    pub fn rewind(&self) {
        self.cursor.set(0);
    }
}

impl Default for Blob<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for Blob<'static> {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<String> for Blob<'static> {
    fn from(data: String) -> Self {
        Self::from_vec(data.into_bytes())
    }
}

impl<'a> From<&'a [u8]> for Blob<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::borrowed(data)
    }
}

impl<'a> From<&'a str> for Blob<'a> {
    fn from(data: &'a str) -> Self {
        Self::borrowed(data.as_bytes())
    }
}

impl AsRef<[u8]> for Blob<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq<Blob<'_>> for Blob<'_> {
    fn eq(&self, other: &Blob<'_>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Blob<'_> {}

impl PartialOrd<Blob<'_>> for Blob<'_> {
    fn partial_cmp(&self, other: &Blob<'_>) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Blob<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Blob<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for Blob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.used)
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor.get())
            .field("strategy", &self.strategy())
            .field("content", &self.to_str_lossy())
            .finish()
    }
}

/// Raw byte writes. Formatted writes (`write!`) go through the general
/// formatter and mark the blob as not pure SQL.
impl io::Write for Blob<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.append(buf);
        Ok(())
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.append_fmt(args);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
