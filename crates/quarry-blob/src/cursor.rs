//! Sequential extraction driven by a blob's cursor.
//!
//! Each operation returns a view: a borrowed [`Blob`] over a slice of the
//! source. Views never own memory and cannot outlive their source. Nothing
//! here can fail; running off the end just yields empty results.

use crate::blob::Blob;
use crate::charclass::is_space;

impl<'a> Blob<'a> {
    /// View of `bytes[start..end]` of this blob.
    fn view(&self, start: usize, end: usize) -> Blob<'_> {
        Blob::borrowed(&self.as_bytes()[start..end])
    }

    /// Take up to `n` bytes starting at the cursor and advance past them.
    /// Returns an empty view when the cursor is already at the end.
    pub fn extract(&self, n: usize) -> Blob<'_> {
        let start = self.cursor.get();
        let end = start + n.min(self.used - start);
        self.cursor.set(end);
        self.view(start, end)
    }

    /// View of the next `n` lines from the cursor, without moving it.
    pub fn extract_lines(&self, n: usize) -> Blob<'_> {
        let start = self.cursor.get();
        let bytes = self.as_bytes();
        let mut end = start;
        let mut remaining = n;
        while remaining > 0 && end < bytes.len() {
            if bytes[end] == b'\n' {
                remaining -= 1;
            }
            end += 1;
        }
        self.view(start, end)
    }

    /// The next line, including its `\n` when there is one.
    pub fn line(&self) -> Option<Blob<'_>> {
        let start = self.cursor.get();
        let bytes = self.as_bytes();
        let end = match bytes[start..].iter().position(|&b| b == b'\n') {
            Some(i) => start + i + 1,
            None => bytes.len(),
        };
        let line = self.extract(end - start);
        (!line.is_empty()).then_some(line)
    }

    /// The next whitespace-delimited token.
    ///
    /// Leading whitespace is skipped, and so is the whitespace after the
    /// token: the cursor is left at the start of whatever follows.
    pub fn token(&self) -> Option<Blob<'_>> {
        let bytes = self.as_bytes();
        let start = skip_space(bytes, self.cursor.get());
        let mut end = start;
        while end < bytes.len() && !is_space(bytes[end]) {
            end += 1;
        }
        self.finish_token(start, end)
    }

    /// Like [`token`](Blob::token), but a token that begins with `'` runs
    /// to the matching unescaped `'` (a doubled `''` is an escaped quote) or
    /// to the end of the content. Quotes are kept in the token.
    pub fn sql_token(&self) -> Option<Blob<'_>> {
        let bytes = self.as_bytes();
        let start = skip_space(bytes, self.cursor.get());
        let mut end = start;
        if bytes.get(start) == Some(&b'\'') {
            end += 1;
            while end < bytes.len() {
                if bytes[end] == b'\'' {
                    end += 1;
                    if bytes.get(end) != Some(&b'\'') {
                        break;
                    }
                }
                end += 1;
            }
        } else {
            while end < bytes.len() && !is_space(bytes[end]) {
                end += 1;
            }
        }
        self.finish_token(start, end)
    }

    fn finish_token(&self, start: usize, end: usize) -> Option<Blob<'_>> {
        let after = skip_space(self.as_bytes(), end);
        self.cursor.set(after);
        (end > start).then(|| self.view(start, end))
    }

    /// Everything from the cursor to the end, without moving the cursor.
    pub fn tail(&self) -> Blob<'_> {
        self.view(self.cursor.get(), self.used)
    }

    /// Append the next `n` lines from the cursor to `dest` and advance past
    /// them. Returns the number of bytes copied.
    pub fn copy_lines(&self, dest: &mut Blob<'_>, n: usize) -> usize {
        let lines = self.extract_lines(n);
        let len = lines.len();
        dest.append(lines.as_bytes());
        self.cursor.set(self.cursor.get() + len);
        len
    }

    /// Append every line from the cursor onward whose first byte is not
    /// `#` to `dest`.
    pub fn strip_comment_lines(&self, dest: &mut Blob<'_>) {
        while let Some(line) = self.line() {
            if line.as_bytes()[0] != b'#' {
                dest.append(line.as_bytes());
            }
        }
    }
}

fn skip_space(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_space(bytes[i]) {
        i += 1;
    }
    i
}
