// ## 📂 File: `src/headers/decode.rs`
//! src/headers/decode.rs
//!
//! Header decoding.
//!
//! Design notes:
//! - Parses the fixed 16-byte big-endian layout written by `encode.rs`.
//! - Rejects unknown magic, unsupported versions and chunk sizes the integrity engine
//!   would refuse, so a bad header never reaches the stream.

use crate::constants::{HEADER_LENGTH, MAGIC_BYTES, MAGIC_LENGTH, NONCE_LENGTH, VERSION};
use crate::headers::types::{Header, HeaderError};
use crate::integrity::validate_chunk_size;

/// Parse the first `HEADER_LENGTH` bytes of `buf`.
#[inline]
pub fn decode_header(buf: &[u8]) -> Result<Header, HeaderError> {
    if buf.len() < HEADER_LENGTH {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need: HEADER_LENGTH });
    }

    let mut i = 0usize;
    #[inline] fn get_u8(buf: &[u8], i: &mut usize) -> u8 { let v = buf[*i]; *i += 1; v }
    #[inline] fn get_u32(buf: &[u8], i: &mut usize) -> u32 {
        let v = u32::from_be_bytes([buf[*i], buf[*i + 1], buf[*i + 2], buf[*i + 3]]); *i += 4; v
    }
    #[inline] fn get_bytes<const N: usize>(buf: &[u8], i: &mut usize) -> [u8; N] {
        let mut dst = [0u8; N]; dst.copy_from_slice(&buf[*i..*i + N]); *i += N; dst
    }

    let magic = get_bytes::<MAGIC_LENGTH>(buf, &mut i);  // 0..3   magic
    let version = get_u8(buf, &mut i);                    // 3..4   version
    let chunk_size = get_u32(buf, &mut i);                // 4..8   chunk size
    let nonce = get_bytes::<NONCE_LENGTH>(buf, &mut i);   // 8..16  nonce
    debug_assert_eq!(i, HEADER_LENGTH);

    if magic != MAGIC_BYTES {
        return Err(HeaderError::InvalidMagic { have: magic, need: MAGIC_BYTES });
    }
    if version != VERSION {
        return Err(HeaderError::UnsupportedVersion { have: version, need: VERSION });
    }
    if validate_chunk_size(chunk_size as usize).is_err() {
        return Err(HeaderError::InvalidChunkSize { have: chunk_size });
    }

    let mut raw = [0u8; HEADER_LENGTH];
    raw.copy_from_slice(&buf[..HEADER_LENGTH]);
    Ok(Header { magic, version, chunk_size, nonce, raw })
}
