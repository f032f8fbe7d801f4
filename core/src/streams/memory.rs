//! streams/memory.rs
//! In-memory stream implementations.
//!
//! - `MemoryStream`: owned, growable, read/write.
//! - `SliceStream`: read-only view over a shared buffer (one per decrypt worker).
//! - `WindowStream`: write-only view over a disjoint slice of a larger physical buffer
//!   (one per encrypt worker); positions are absolute in the larger buffer.

use crate::streams::types::RandomAccessStream;
use crate::types::StreamError;

fn not_supported(what: &str) -> StreamError {
    StreamError::Validation(format!("{} is not supported by this stream", what))
}

fn to_index(value: u64) -> Result<usize, StreamError> {
    usize::try_from(value)
        .map_err(|_| StreamError::Validation(format!("offset {} does not fit in memory", value)))
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStream {
    data: Vec<u8>,
    position: usize,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity), position: 0 }
    }

    /// Copy of the stream contents.
    pub fn to_array(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl RandomAccessStream for MemoryStream {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn length(&self) -> Result<u64, StreamError> {
        Ok(self.data.len() as u64)
    }

    /// Truncate or zero-extend. The position is clamped to the new length.
    fn set_length(&mut self, length: u64) -> Result<(), StreamError> {
        self.data.resize(to_index(length)?, 0);
        self.position = self.position.min(self.data.len());
        Ok(())
    }

    fn position(&self) -> Result<u64, StreamError> {
        Ok(self.position as u64)
    }

    fn set_position(&mut self, position: u64) -> Result<(), StreamError> {
        self.position = to_index(position)?;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError> {
        if self.position >= self.data.len() {
            return Ok(0);
        }
        let n = buffer.len().min(self.data.len() - self.position);
        buffer[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }

    /// Writing past the end zero-fills the gap.
    fn write(&mut self, buffer: &[u8]) -> Result<(), StreamError> {
        let end = self.position + buffer.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.position..end].copy_from_slice(buffer);
        self.position = end;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

/// Read-only stream over borrowed bytes.
#[derive(Debug, Clone)]
pub struct SliceStream<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }
}

impl RandomAccessStream for SliceStream<'_> {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        false
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn length(&self) -> Result<u64, StreamError> {
        Ok(self.data.len() as u64)
    }

    fn set_length(&mut self, _length: u64) -> Result<(), StreamError> {
        Err(not_supported("set_length"))
    }

    fn position(&self) -> Result<u64, StreamError> {
        Ok(self.position as u64)
    }

    fn set_position(&mut self, position: u64) -> Result<(), StreamError> {
        self.position = to_index(position)?;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError> {
        if self.position >= self.data.len() {
            return Ok(0);
        }
        let n = buffer.len().min(self.data.len() - self.position);
        buffer[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }

    fn write(&mut self, _buffer: &[u8]) -> Result<(), StreamError> {
        Err(not_supported("write"))
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

/// Write window `[origin, origin + buf.len())` of a larger physical stream.
///
/// Positions are absolute; `length()` reports the end of the window. Writes outside the
/// window fail instead of growing it.
#[derive(Debug)]
pub struct WindowStream<'a> {
    buf: &'a mut [u8],
    origin: u64,
    position: u64,
}

impl<'a> WindowStream<'a> {
    pub fn new(buf: &'a mut [u8], origin: u64) -> Self {
        Self { buf, origin, position: origin }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }
}

impl RandomAccessStream for WindowStream<'_> {
    fn can_read(&self) -> bool {
        false
    }

    fn can_write(&self) -> bool {
        true
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn length(&self) -> Result<u64, StreamError> {
        Ok(self.origin + self.buf.len() as u64)
    }

    fn set_length(&mut self, _length: u64) -> Result<(), StreamError> {
        Err(not_supported("set_length"))
    }

    fn position(&self) -> Result<u64, StreamError> {
        Ok(self.position)
    }

    fn set_position(&mut self, position: u64) -> Result<(), StreamError> {
        self.position = position;
        Ok(())
    }

    fn read(&mut self, _buffer: &mut [u8]) -> Result<usize, StreamError> {
        Err(not_supported("read"))
    }

    fn write(&mut self, buffer: &[u8]) -> Result<(), StreamError> {
        let start = self
            .position
            .checked_sub(self.origin)
            .map(to_index)
            .transpose()?
            .filter(|s| s + buffer.len() <= self.buf.len())
            .ok_or_else(|| {
                StreamError::Validation(format!(
                    "write of {} bytes at {} is outside window [{}, {})",
                    buffer.len(),
                    self.position,
                    self.origin,
                    self.origin + self.buf.len() as u64
                ))
            })?;
        self.buf[start..start + buffer.len()].copy_from_slice(buffer);
        self.position += buffer.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::SeekFrom;

    #[test]
    fn memory_stream_read_write_seek() {
        let mut m = MemoryStream::new();
        m.write(b"hello world").unwrap();
        assert_eq!(m.length().unwrap(), 11);
        m.seek(SeekFrom::Start(6)).unwrap();
        let mut buf = [0u8; 16];
        let n = m.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"world");
        assert_eq!(m.read(&mut buf).unwrap(), 0);
        assert_eq!(m.seek(SeekFrom::End(-5)).unwrap(), 6);
        assert!(m.seek(SeekFrom::Current(-100)).is_err());
    }

    #[test]
    fn memory_stream_write_past_end_zero_fills() {
        let mut m = MemoryStream::new();
        m.set_position(4).unwrap();
        m.write(&[9]).unwrap();
        assert_eq!(m.to_array(), vec![0, 0, 0, 0, 9]);
        m.set_length(2).unwrap();
        assert_eq!(m.position().unwrap(), 2);
    }

    #[test]
    fn slice_stream_is_read_only() {
        let data = [1u8, 2, 3];
        let mut s = SliceStream::new(&data);
        assert!(s.write(&[1]).is_err());
        let mut buf = [0u8; 2];
        assert_eq!(s.read(&mut buf).unwrap(), 2);
        assert_eq!(s.read(&mut buf).unwrap(), 1);
    }

    #[test]
    fn window_stream_bounds() {
        let mut backing = [0u8; 8];
        let mut w = WindowStream::new(&mut backing[4..], 4);
        w.write(&[1, 2]).unwrap();
        assert!(w.write(&[3, 4, 5]).is_err());
        w.set_position(2).unwrap();
        assert!(w.write(&[1]).is_err());
        assert_eq!(backing, [0, 0, 0, 0, 1, 2, 0, 0]);
    }
}
