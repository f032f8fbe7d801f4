//! headers/stream.rs
//! Reading and writing the header through a `RandomAccessStream`.

use tracing::trace;

use crate::constants::{HEADER_LENGTH, NONCE_LENGTH};
use crate::crypto::SecurityError;
use crate::headers::decode::decode_header;
use crate::headers::types::{Header, HeaderError};
use crate::integrity::validate_chunk_size;
use crate::streams::{read_fully, RandomAccessStream};
use crate::types::StreamError;

/// Serialize a header for `nonce`/`chunk_size` at the stream's current position and flush.
pub fn write_header(
    stream: &mut dyn RandomAccessStream,
    nonce: &[u8],
    chunk_size: u32,
) -> Result<Header, StreamError> {
    let nonce: [u8; NONCE_LENGTH] =
        nonce.try_into().map_err(|_| SecurityError::InvalidNonceLength {
            expected: NONCE_LENGTH,
            actual: nonce.len(),
        })?;
    validate_chunk_size(chunk_size as usize)?;

    let header = Header::new(nonce, chunk_size);
    stream.write(header.header_data())?;
    stream.flush()?;
    trace!(chunk_size, nonce = %hex::encode(nonce), "header written");
    Ok(header)
}

/// Read the header at offset 0, restoring the stream position afterwards.
///
/// Returns `Ok(None)` for an empty stream; a non-empty stream too short for a header is
/// `HeaderError::BufferTooShort`.
pub fn read_header_data(stream: &mut dyn RandomAccessStream) -> Result<Option<Header>, StreamError> {
    if stream.length()? == 0 {
        return Ok(None);
    }

    let saved = stream.position()?;
    stream.set_position(0)?;
    let mut buf = [0u8; HEADER_LENGTH];
    let read = read_fully(stream, &mut buf);
    stream.set_position(saved)?;

    let n = read?;
    if n < HEADER_LENGTH {
        return Err(HeaderError::BufferTooShort { have: n, need: HEADER_LENGTH }.into());
    }
    Ok(Some(decode_header(&buf)?))
}
