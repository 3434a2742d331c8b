use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use quarry_blob::{fatal, Blob, MAX_BLOB_SIZE};
use tracing::{debug, warn};

use crate::error::{CompressError, CompressResult};

/// Size of the big-endian length header.
pub const HEADER_LEN: usize = 4;

/// Upper bound on the envelope size for `n` input bytes.
fn envelope_bound(n: usize) -> usize {
    n + n / 1000 + 13 + HEADER_LEN
}

fn encode(parts: &[&[u8]]) -> Blob<'static> {
    let total: usize = parts.iter().map(|p| p.len()).sum();
    let Ok(header) = u32::try_from(total) else {
        fatal!("compress: {total} bytes of input do not fit the envelope header");
    };
    let mut out = Vec::with_capacity(envelope_bound(total));
    out.extend_from_slice(&header.to_be_bytes());

    let mut encoder = ZlibEncoder::new(out, Compression::best());
    for part in parts {
        if let Err(e) = encoder.write_all(part) {
            fatal!("compress: zlib encoder failed: {e}");
        }
    }
    let out = match encoder.finish() {
        Ok(out) => out,
        Err(e) => fatal!("compress: zlib encoder failed: {e}"),
    };
    debug!(input = total, output = out.len(), "compressed");
    Blob::from_vec(out)
}

/// Wrap `input` in a compression envelope: the input length as a 4-byte
/// big-endian integer, then the zlib stream of the input.
pub fn compress(input: &Blob<'_>) -> Blob<'static> {
    encode(&[input.as_bytes()])
}

/// Compress `first` followed by `second` as one stream. The envelope
/// records the combined length and decompresses to the concatenation.
pub fn compress_concat(first: &Blob<'_>, second: &Blob<'_>) -> Blob<'static> {
    encode(&[first.as_bytes(), second.as_bytes()])
}

/// The length an envelope declares, or `None` if it is too short to have
/// a header.
pub fn declared_len(envelope: &[u8]) -> Option<usize> {
    let header: [u8; HEADER_LEN] = envelope.get(..HEADER_LEN)?.try_into().ok()?;
    Some(u32::from_be_bytes(header) as usize)
}

fn inflate(envelope: &[u8]) -> CompressResult<Vec<u8>> {
    if envelope.len() <= HEADER_LEN {
        return Ok(Vec::new());
    }
    let declared = declared_len(envelope).unwrap_or_default();
    if declared.saturating_add(1) >= MAX_BLOB_SIZE {
        return Err(CompressError::DeclaredTooLarge { declared });
    }

    let mut out = Vec::with_capacity(declared + 1);
    // One byte past the declared length is enough to notice an overrun.
    let mut decoder = ZlibDecoder::new(&envelope[HEADER_LEN..]).take(declared as u64 + 1);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CompressError::Corrupt(e.to_string()))?;
    if out.len() > declared {
        return Err(CompressError::LengthMismatch { declared });
    }
    Ok(out)
}

/// Decompress an envelope into a new blob.
///
/// Envelopes of four bytes or fewer decompress to an empty blob. A stream
/// that inflates to fewer bytes than declared is accepted as is.
pub fn decompress(input: &Blob<'_>) -> CompressResult<Blob<'static>> {
    let mut out = Blob::new();
    decompress_into(input, &mut out)?;
    Ok(out)
}

/// Decompress `input` into `dest`, replacing its content. Returns the
/// decompressed length. On failure `dest` is reset.
pub fn decompress_into(input: &Blob<'_>, dest: &mut Blob<'_>) -> CompressResult<usize> {
    dest.reset();
    match inflate(input.as_bytes()) {
        Ok(bytes) => {
            let len = bytes.len();
            *dest = Blob::from_vec(bytes);
            Ok(len)
        }
        Err(e) => {
            warn!(input = input.len(), error = %e, "decompression failed");
            Err(e)
        }
    }
}

/// Decompress `blob` in place. On failure the compressed content is left
/// untouched.
pub fn decompress_in_place(blob: &mut Blob<'_>) -> CompressResult<usize> {
    let mut out = Blob::new();
    let len = decompress_into(blob, &mut out)?;
    *blob = out;
    Ok(len)
}
