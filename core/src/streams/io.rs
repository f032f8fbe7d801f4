// ## 📂 File: `src/streams/io.rs`
// Adapter from any std `Read + Write + Seek` (files, cursors) to `RandomAccessStream`.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::streams::types::RandomAccessStream;
use crate::types::StreamError;

/// Wraps a std stream. Position and length are cached so getters need no `&mut`.
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
    position: u64,
    length: u64,
    readable: bool,
    writable: bool,
}

impl<T: Read + Write + Seek + Send> IoStream<T> {
    /// Wrap `inner`, starting at its current position.
    pub fn new(mut inner: T) -> Result<Self, StreamError> {
        let position = inner.stream_position()?;
        let length = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(position))?;
        Ok(Self { inner, position, length, readable: true, writable: true })
    }

    /// Mark the adapter read-only (writes are rejected before touching `inner`).
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Seek + Send> RandomAccessStream for IoStream<T> {
    fn can_read(&self) -> bool {
        self.readable
    }

    fn can_write(&self) -> bool {
        self.writable
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn length(&self) -> Result<u64, StreamError> {
        Ok(self.length)
    }

    fn set_length(&mut self, _length: u64) -> Result<(), StreamError> {
        Err(StreamError::Validation("set_length is not supported by std stream adapters".into()))
    }

    fn position(&self) -> Result<u64, StreamError> {
        Ok(self.position)
    }

    fn set_position(&mut self, position: u64) -> Result<(), StreamError> {
        self.position = self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError> {
        let n = self.inner.read(buffer)?;
        self.position += n as u64;
        Ok(n)
    }

    fn write(&mut self, buffer: &[u8]) -> Result<(), StreamError> {
        if !self.writable {
            return Err(StreamError::Validation("stream is read-only".into()));
        }
        self.inner.write_all(buffer)?;
        self.position += buffer.len() as u64;
        self.length = self.length.max(self.position);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(self.inner.flush()?)
    }
}
