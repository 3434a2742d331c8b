//! In-place text transforms: line endings and encodings.
//!
//! Transforms that grow the content count the growth first, resize once,
//! and then rewrite from the back so no second buffer is needed.

use crate::blob::Blob;
use crate::strategy::GrowthStrategy;

/// Unicode code points of CP1252 bytes 0x80..=0x9F. Bytes with no CP1252
/// assignment map to themselves, as in ISO-8859-1.
const CP1252: [u16; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, //
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x008D, 0x017D, 0x008F, //
    0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, //
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178, //
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Length of a UTF-8 byte order mark at the start of `bytes`, if any.
pub fn utf8_bom_len(bytes: &[u8]) -> Option<usize> {
    bytes.starts_with(UTF8_BOM).then_some(UTF8_BOM.len())
}

/// Byte order of a UTF-16 byte order mark at the start of `bytes`.
///
/// Returns `Some(false)` for a mark in native byte order, `Some(true)` for a
/// reversed one, and `None` when there is no mark or the length is odd.
pub fn utf16_bom(bytes: &[u8]) -> Option<bool> {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return None;
    }
    match u16::from_ne_bytes([bytes[0], bytes[1]]) {
        0xFEFF => Some(false),
        0xFFFE => Some(true),
        _ => None,
    }
}

/// Decode native-order UTF-16 to UTF-8, replacing unpaired surrogates.
pub fn utf16_to_utf8(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

impl<'a> Blob<'a> {
    /// Make the content owned with live length `new_len` and a terminator,
    /// keeping the first `len()` bytes. Returns the owned store.
    fn grow_in_place(&mut self, new_len: usize) -> &mut Vec<u8> {
        if new_len >= self.capacity() || self.strategy() == GrowthStrategy::Borrowed {
            self.resize(new_len);
        } else {
            self.set_used(new_len);
        }
        let store = self.owned_store();
        store[new_len] = 0;
        store
    }

    /// Make the content owned with room for a terminator after it.
    fn make_writable(&mut self) {
        if self.strategy() == GrowthStrategy::Borrowed || self.used >= self.capacity() {
            self.materialize();
        }
    }

    /// Convert every `\n` into `\r\n`.
    pub fn add_cr(&mut self) {
        let old_len = self.used;
        let newlines = self.as_bytes().iter().filter(|&&b| b == b'\n').count();
        if newlines == 0 {
            return;
        }
        let new_len = old_len + newlines;
        let store = self.grow_in_place(new_len);
        let (mut i, mut j) = (old_len, new_len);
        while j > i {
            i -= 1;
            j -= 1;
            store[j] = store[i];
            if store[j] == b'\n' {
                j -= 1;
                store[j] = b'\r';
            }
        }
    }

    /// Convert `\r\n` and lone `\r` into `\n`.
    pub fn to_lf_only(&mut self) {
        if !self.as_bytes().contains(&b'\r') {
            return;
        }
        self.make_writable();
        let len = self.used;
        let store = self.owned_store();
        let mut j = 0;
        for i in 0..len {
            let c = store[i];
            if c != b'\r' {
                store[j] = c;
                j += 1;
            } else if i + 1 >= len || store[i + 1] != b'\n' {
                store[j] = b'\n';
                j += 1;
            }
        }
        store[j] = 0;
        self.set_used(j);
    }

    /// Transcode Windows-1252 to UTF-8.
    ///
    /// Bytes 0x80..=0x9F go through the CP1252 table; 0xA0..=0xFF are taken
    /// as ISO-8859-1. ASCII passes through unchanged.
    pub fn cp1252_to_utf8(&mut self) {
        let old_len = self.used;
        let extra: usize = self
            .as_bytes()
            .iter()
            .map(|&b| match b {
                0x80..=0x9F if CP1252[(b & 0x1F) as usize] >= 0x800 => 2,
                0x80..=0xFF => 1,
                _ => 0,
            })
            .sum();
        if extra == 0 {
            return;
        }
        let new_len = old_len + extra;
        let store = self.grow_in_place(new_len);
        let (mut i, mut j) = (old_len, new_len);
        while j > i {
            i -= 1;
            let c = store[i];
            if c < 0x80 {
                j -= 1;
                store[j] = c;
                continue;
            }
            let sym = if c < 0xA0 {
                CP1252[(c & 0x1F) as usize]
            } else {
                u16::from(c)
            };
            if sym >= 0x800 {
                store[j - 1] = 0x80 | (sym & 0x3F) as u8;
                store[j - 2] = 0x80 | ((sym >> 6) & 0x3F) as u8;
                store[j - 3] = 0xE0 | (sym >> 12) as u8;
                j -= 3;
            } else {
                store[j - 1] = 0x80 | (sym & 0x3F) as u8;
                store[j - 2] = 0xC0 | (sym >> 6) as u8;
                j -= 2;
            }
        }
    }

    /// Remove a leading UTF-8 byte order mark. Returns `true` if one was
    /// present.
    pub fn strip_utf8_bom(&mut self) -> bool {
        let Some(bom) = utf8_bom_len(self.as_bytes()) else {
            return false;
        };
        self.make_writable();
        let len = self.used;
        let store = self.owned_store();
        store.copy_within(bom..len, 0);
        store[len - bom] = 0;
        self.set_used(len - bom);
        true
    }

    /// Normalize the content to UTF-8 without a byte order mark.
    ///
    /// A UTF-8 mark is dropped. UTF-16 with a mark in either byte order is
    /// decoded (reversed input is byte-swapped in place first). Otherwise,
    /// if `assume_cp1252` is set and the content is not valid UTF-8, it is
    /// transcoded from CP1252.
    pub fn to_utf8_no_bom(&mut self, assume_cp1252: bool) {
        if self.strip_utf8_bom() {
            return;
        }
        if let Some(reversed) = utf16_bom(self.as_bytes()) {
            if reversed {
                for pair in self.as_bytes_mut().chunks_exact_mut(2) {
                    pair.swap(0, 1);
                }
            }
            let text = utf16_to_utf8(&self.as_bytes()[2..]);
            *self = Blob::from(text);
            return;
        }
        if assume_cp1252 && std::str::from_utf8(self.as_bytes()).is_err() {
            self.cp1252_to_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_cr_converts_each_newline() {
        let mut blob = Blob::borrowed(b"a\nb\n\nc");
        blob.add_cr();
        assert_eq!(blob.as_bytes(), b"a\r\nb\r\n\r\nc");
        assert_eq!(blob.terminated(), b"a\r\nb\r\n\r\nc\0");
    }

    #[test]
    fn add_cr_without_newlines_is_noop() {
        let mut blob = Blob::borrowed(b"plain");
        blob.add_cr();
        assert_eq!(blob.as_bytes(), b"plain");
    }

    #[test]
    fn add_cr_reuses_spare_capacity() {
        let mut blob = Blob::with_capacity(64);
        blob.append(b"x\ny\n");
        let capacity = blob.capacity();
        blob.add_cr();
        assert_eq!(blob.as_bytes(), b"x\r\ny\r\n");
        assert_eq!(blob.capacity(), capacity);
    }

    #[test]
    fn to_lf_only_normalizes() {
        let mut blob = Blob::from_vec(b"a\r\nb\rc\n\r".to_vec());
        blob.to_lf_only();
        assert_eq!(blob.as_bytes(), b"a\nb\nc\n\n");
    }

    #[test]
    fn to_lf_only_lone_cr_in_exact_store() {
        let mut blob = Blob::from_vec(b"a\rb".to_vec());
        blob.to_lf_only();
        assert_eq!(blob.terminated(), b"a\nb\0");
    }

    #[test]
    fn to_lf_only_keeps_embedded_nul() {
        let mut blob = Blob::from_vec(b"a\0\r\nb".to_vec());
        blob.to_lf_only();
        assert_eq!(blob.as_bytes(), b"a\0\nb");
    }

    #[test]
    fn cp1252_curly_quote() {
        let mut blob = Blob::borrowed(&[0x93, 0x41]);
        blob.cp1252_to_utf8();
        assert_eq!(blob.as_bytes(), &[0xE2, 0x80, 0x9C, 0x41]);
    }

    #[test]
    fn cp1252_mixed() {
        // Euro sign, a Latin-1 e-acute, an undefined slot and ASCII.
        let mut blob = Blob::from_vec(vec![0x80, 0xE9, 0x81, b'z']);
        blob.cp1252_to_utf8();
        let expected = "\u{20AC}\u{E9}\u{81}z";
        assert_eq!(blob.as_bytes(), expected.as_bytes());
    }

    #[test]
    fn cp1252_ascii_unchanged() {
        let mut blob = Blob::borrowed(b"ASCII only");
        blob.cp1252_to_utf8();
        assert_eq!(blob.as_bytes(), b"ASCII only");
    }

    #[test]
    fn strip_utf8_bom_removes_mark() {
        let mut blob = Blob::from_vec(b"\xEF\xBB\xBFtext".to_vec());
        assert!(blob.strip_utf8_bom());
        assert_eq!(blob.as_bytes(), b"text");
        assert!(!blob.strip_utf8_bom());
    }

    fn utf16_bytes(text: &str, big_endian: bool) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in std::iter::once(0xFEFF).chain(text.encode_utf16()) {
            let pair = if big_endian {
                unit.to_be_bytes()
            } else {
                unit.to_le_bytes()
            };
            out.extend_from_slice(&pair);
        }
        out
    }

    #[test]
    fn utf16_both_byte_orders() {
        for big_endian in [false, true] {
            let mut blob = Blob::from_vec(utf16_bytes("h\u{e9}llo \u{1F600}", big_endian));
            blob.to_utf8_no_bom(false);
            assert_eq!(blob.to_str_lossy(), "h\u{e9}llo \u{1F600}");
        }
    }

    #[test]
    fn utf16_bom_detection() {
        let native = 0xFEFFu16.to_ne_bytes();
        assert_eq!(utf16_bom(&native), Some(false));
        let swapped = [native[1], native[0]];
        assert_eq!(utf16_bom(&swapped), Some(true));
        assert_eq!(utf16_bom(&[native[0], native[1], 0x41]), None);
        assert_eq!(utf16_bom(b"ab"), None);
    }

    #[test]
    fn to_utf8_no_bom_cp1252_fallback() {
        let mut blob = Blob::from_vec(vec![b'a', 0x93, b'b', 0x94]);
        blob.to_utf8_no_bom(true);
        assert_eq!(blob.to_str_lossy(), "a\u{201C}b\u{201D}");

        let mut untouched = Blob::from_vec(vec![b'a', 0x93]);
        untouched.to_utf8_no_bom(false);
        assert_eq!(untouched.as_bytes(), &[b'a', 0x93]);
    }

    #[test]
    fn to_utf8_no_bom_leaves_valid_utf8() {
        let mut blob = Blob::from("d\u{e9}j\u{e0} vu");
        blob.to_utf8_no_bom(true);
        assert_eq!(blob.to_str_lossy(), "d\u{e9}j\u{e0} vu");
    }

    proptest! {
        #[test]
        fn crlf_round_trip(lines in proptest::collection::vec("[^\r\n]{0,20}", 0..20)) {
            let text: String = lines.iter().map(|l| format!("{l}\n")).collect();
            let mut blob = Blob::from(text.clone());
            blob.add_cr();
            blob.to_lf_only();
            prop_assert_eq!(blob.as_bytes(), text.as_bytes());
        }

        #[test]
        fn cp1252_output_is_utf8(data in proptest::collection::vec(any::<u8>(), 0..200)) {
            let mut blob = Blob::from_vec(data.clone());
            blob.cp1252_to_utf8();
            prop_assert!(std::str::from_utf8(blob.as_bytes()).is_ok());
            let ascii: Vec<u8> = data.into_iter().filter(u8::is_ascii).collect();
            let out_ascii: Vec<u8> = blob.as_bytes().iter().copied().filter(u8::is_ascii).collect();
            prop_assert_eq!(ascii, out_ascii);
        }
    }
}
