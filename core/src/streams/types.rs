//! streams/types.rs
//! Seekable byte stream abstraction consumed by the header codec and `AesStream`.
//!
//! Contract:
//! - `read` returns `Ok(0)` at end of stream; a short read is not an error.
//! - `write` writes the whole buffer or fails.
//! - Positions and lengths are physical byte offsets of this stream.

use std::io::SeekFrom;

use crate::constants::DEFAULT_BUFFER_SIZE;
use crate::types::StreamError;

pub trait RandomAccessStream: Send {
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;
    fn can_seek(&self) -> bool;

    fn length(&self) -> Result<u64, StreamError>;
    fn set_length(&mut self, length: u64) -> Result<(), StreamError>;

    fn position(&self) -> Result<u64, StreamError>;
    fn set_position(&mut self, position: u64) -> Result<(), StreamError>;

    /// Preferred I/O granularity; 0 means any size is fine.
    fn align_size(&self) -> usize {
        0
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError>;
    fn write(&mut self, buffer: &[u8]) -> Result<(), StreamError>;

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position()?.checked_add_signed(delta),
            SeekFrom::End(delta) => self.length()?.checked_add_signed(delta),
        }
        .ok_or_else(|| StreamError::Validation(format!("invalid seek {:?}", pos)))?;
        self.set_position(target)?;
        Ok(target)
    }

    fn flush(&mut self) -> Result<(), StreamError>;

    fn close(&mut self) -> Result<(), StreamError> {
        self.flush()
    }
}

/// Read until `buffer` is full or the stream ends. Returns bytes read.
pub fn read_fully<S: RandomAccessStream + ?Sized>(
    stream: &mut S,
    buffer: &mut [u8],
) -> Result<usize, StreamError> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = stream.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Copy `source` from its current position to the end into `dest`.
///
/// - The buffer is rounded down to a multiple of the source's align size (never below it).
/// - `progress` receives `(bytes_copied, total_bytes)` after every buffer.
/// - The source position is restored afterwards; `dest` is flushed.
pub fn copy_to(
    source: &mut dyn RandomAccessStream,
    dest: &mut dyn RandomAccessStream,
    buffer_size: usize,
    mut progress: Option<&mut dyn FnMut(u64, u64)>,
) -> Result<u64, StreamError> {
    if !source.can_read() {
        return Err(StreamError::Validation("source stream is not readable".into()));
    }
    if !dest.can_write() {
        return Err(StreamError::Validation("destination stream is not writable".into()));
    }

    let mut buffer_size = if buffer_size == 0 { DEFAULT_BUFFER_SIZE } else { buffer_size };
    let align = source.align_size();
    if align > 0 {
        buffer_size = (buffer_size / align).max(1) * align;
    }

    let start = source.position()?;
    let total = source.length()?;
    let mut copied = 0u64;
    let mut buffer = vec![0u8; buffer_size];
    loop {
        let n = source.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        dest.write(&buffer[..n])?;
        copied += n as u64;
        if let Some(cb) = progress.as_mut() {
            cb(start + copied, total);
        }
    }
    dest.flush()?;
    source.set_position(start)?;
    Ok(copied)
}
