//! convert.rs
//! Integer <-> byte array conversions (big-endian by default, little-endian on request).
//!
//! Used for counters, nonces, header fields and lengths. Values wider than the
//! requested byte width are truncated to their low-order bytes.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::types::StreamError;

fn check_width(length: usize) -> Result<(), StreamError> {
    if length == 0 || length > 8 {
        return Err(StreamError::Validation(format!(
            "integer width must be 1..=8 bytes, got {}",
            length
        )));
    }
    Ok(())
}

fn truncate(value: u64, length: usize) -> u64 {
    if length == 8 {
        value
    } else {
        value & ((1u64 << (length * 8)) - 1)
    }
}

/// Big-endian encode the low `length` bytes of `value`.
pub fn to_bytes(value: u64, length: usize) -> Result<Vec<u8>, StreamError> {
    check_width(length)?;
    let mut out = vec![0u8; length];
    BigEndian::write_uint(&mut out, truncate(value, length), length);
    Ok(out)
}

/// Big-endian decode `length` bytes of `bytes` starting at `offset`.
pub fn to_long(bytes: &[u8], offset: usize, length: usize) -> Result<u64, StreamError> {
    check_width(length)?;
    let src = window(bytes, offset, length)?;
    Ok(BigEndian::read_uint(src, length))
}

/// Little-endian encode the low `length` bytes of `value`.
pub fn to_bytes_le(value: u64, length: usize) -> Result<Vec<u8>, StreamError> {
    check_width(length)?;
    let mut out = vec![0u8; length];
    LittleEndian::write_uint(&mut out, truncate(value, length), length);
    Ok(out)
}

/// Little-endian decode `length` bytes of `bytes` starting at `offset`.
pub fn to_long_le(bytes: &[u8], offset: usize, length: usize) -> Result<u64, StreamError> {
    check_width(length)?;
    let src = window(bytes, offset, length)?;
    Ok(LittleEndian::read_uint(src, length))
}

fn window(bytes: &[u8], offset: usize, length: usize) -> Result<&[u8], StreamError> {
    offset
        .checked_add(length)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            StreamError::Validation(format!(
                "cannot read {} bytes at offset {} from a {}-byte buffer",
                length,
                offset,
                bytes.len()
            ))
        })
}
