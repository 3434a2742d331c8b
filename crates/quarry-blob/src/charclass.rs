//! ASCII byte classification.
//!
//! These never consult the host locale: a repository must parse the same
//! way everywhere. Bytes at or above 0x80 belong to no class.

const SPACE: u8 = 0x01;
const DIGIT: u8 = 0x02;
const UPPER: u8 = 0x04;
const LOWER: u8 = 0x08;
const HEX_UPPER: u8 = 0x10;
const HEX_LOWER: u8 = 0x20;

static CLASS: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut c = 0usize;
    while c < 256 {
        let b = c as u8;
        let mut class = 0u8;
        if matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r') {
            class |= SPACE;
        }
        if b >= b'0' && b <= b'9' {
            class |= DIGIT;
        }
        if b >= b'A' && b <= b'Z' {
            class |= UPPER;
        }
        if b >= b'a' && b <= b'z' {
            class |= LOWER;
        }
        if b >= b'A' && b <= b'F' {
            class |= HEX_UPPER;
        }
        if b >= b'a' && b <= b'f' {
            class |= HEX_LOWER;
        }
        table[c] = class;
        c += 1;
    }
    table
}

#[inline]
fn has(c: u8, class: u8) -> bool {
    CLASS[c as usize] & class != 0
}

/// Space, tab, newline, vertical tab, form feed or carriage return.
#[inline]
pub fn is_space(c: u8) -> bool {
    has(c, SPACE)
}

#[inline]
pub fn is_digit(c: u8) -> bool {
    has(c, DIGIT)
}

#[inline]
pub fn is_upper(c: u8) -> bool {
    has(c, UPPER)
}

#[inline]
pub fn is_lower(c: u8) -> bool {
    has(c, LOWER)
}

#[inline]
pub fn is_alpha(c: u8) -> bool {
    has(c, UPPER | LOWER)
}

#[inline]
pub fn is_alnum(c: u8) -> bool {
    has(c, UPPER | LOWER | DIGIT)
}

/// `0-9`, `a-f` or `A-F`.
#[inline]
pub fn is_xdigit(c: u8) -> bool {
    has(c, DIGIT | HEX_UPPER | HEX_LOWER)
}

/// `0-9` or `a-f`.
#[inline]
pub fn is_xdigit_lower(c: u8) -> bool {
    has(c, DIGIT | HEX_LOWER)
}

/// `0-9` or `A-F`.
#[inline]
pub fn is_xdigit_upper(c: u8) -> bool {
    has(c, DIGIT | HEX_UPPER)
}

#[inline]
pub fn to_lower(c: u8) -> u8 {
    if is_upper(c) {
        c + 32
    } else {
        c
    }
}

#[inline]
pub fn to_upper(c: u8) -> u8 {
    if is_lower(c) {
        c - 32
    } else {
        c
    }
}

/// Check every classifier against its definition over all 256 byte values.
/// Returns the bytes for which some classifier disagrees.
pub fn self_check() -> Vec<u8> {
    (0..=255u8)
        .filter(|&c| {
            let space = matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r');
            let digit = c.is_ascii_digit();
            let upper = c.is_ascii_uppercase();
            let lower = c.is_ascii_lowercase();
            let xdigit = c.is_ascii_hexdigit();
            is_space(c) != space
                || is_digit(c) != digit
                || is_upper(c) != upper
                || is_lower(c) != lower
                || is_alpha(c) != (upper || lower)
                || is_alnum(c) != (upper || lower || digit)
                || is_xdigit(c) != xdigit
                || is_xdigit_lower(c) != (digit || (b'a'..=b'f').contains(&c))
                || is_xdigit_upper(c) != (digit || (b'A'..=b'F').contains(&c))
                || to_lower(c) != c.to_ascii_lowercase()
                || to_upper(c) != c.to_ascii_uppercase()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_exact_over_all_bytes() {
        let expected = [b' ', b'\t', b'\n', 0x0b, 0x0c, b'\r'];
        for c in 0..=255u8 {
            assert_eq!(is_space(c), expected.contains(&c), "byte {c:#04x}");
        }
    }

    #[test]
    fn self_check_passes() {
        assert!(self_check().is_empty());
    }

    #[test]
    fn high_bytes_have_no_class() {
        for c in 0x80..=0xffu8 {
            assert!(!is_space(c) && !is_alnum(c) && !is_xdigit(c));
            assert_eq!(to_lower(c), c);
        }
    }

    #[test]
    fn hex_variants() {
        assert!(is_xdigit(b'F') && is_xdigit(b'f'));
        assert!(is_xdigit_lower(b'f') && !is_xdigit_lower(b'F'));
        assert!(is_xdigit_upper(b'F') && !is_xdigit_upper(b'f'));
        assert!(!is_xdigit(b'g'));
    }
}
