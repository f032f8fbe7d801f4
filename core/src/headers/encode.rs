// ## 📂 File: `src/headers/encode.rs`
//! src/headers/encode.rs
//!
//! Header encoding.
//!
//! Design notes:
//! - Serializes a `Header` into the fixed 16-byte layout in big-endian order.
//! - Field order must match `decode.rs` exactly.

use crate::constants::HEADER_LENGTH;
use crate::headers::types::Header;

/// Serialize header fields into `[u8; HEADER_LENGTH]`.
#[inline]
pub fn encode_header(h: &Header) -> [u8; HEADER_LENGTH] {
    let mut out = [0u8; HEADER_LENGTH];
    let mut i = 0usize;

    fn put_u8(out: &mut [u8], i: &mut usize, v: u8) {
        out[*i] = v;
        *i += 1;
    }
    fn put_u32(out: &mut [u8], i: &mut usize, v: u32) {
        out[*i..*i + 4].copy_from_slice(&v.to_be_bytes());
        *i += 4;
    }
    fn put_bytes(out: &mut [u8], i: &mut usize, b: &[u8]) {
        out[*i..*i + b.len()].copy_from_slice(b);
        *i += b.len();
    }

    put_bytes(&mut out, &mut i, &h.magic);   // 0..3   magic
    put_u8(&mut out, &mut i, h.version);     // 3..4   version
    put_u32(&mut out, &mut i, h.chunk_size); // 4..8   chunk size
    put_bytes(&mut out, &mut i, &h.nonce);   // 8..16  nonce

    debug_assert_eq!(i, HEADER_LENGTH, "encoding wrote incorrect length");
    out
}
