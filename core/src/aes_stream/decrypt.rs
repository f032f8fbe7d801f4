//! aes_stream/decrypt.rs
//! Read path: whole-unit physical reads, decrypt into a private buffer, verify, then copy out.
//!
//! Plaintext reaches the caller only after every chunk it came from has been verified.

use std::io;

use crate::aes_stream::core::AesStream;
use crate::constants::HEADER_LENGTH;
use crate::integrity::IntegrityError;
use crate::streams::{read_fully, RandomAccessStream};
use crate::telemetry::Stage;
use crate::types::{EncryptionMode, StreamError};

impl<S: RandomAccessStream> AesStream<S> {
    /// Decrypt into `buffer` from the current logical position. Returns 0 at end of stream.
    ///
    /// Unaligned positions are served by decoding the enclosing chunk (or block) and
    /// skipping the leading bytes.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if self.mode != EncryptionMode::Decrypt {
            return Err(StreamError::Validation("stream is not in decrypt mode".into()));
        }
        let length = self.length()?;
        if buffer.is_empty() {
            return Ok(0);
        }
        if self.position >= length {
            self.check_trailing_hash()?;
            return Ok(0);
        }

        let align = self.align_size() as u64;
        let mut total = 0usize;
        while total < buffer.len() && self.position < length {
            let pos = self.position;
            let unit_start = pos - pos % align;
            let skip = (pos - unit_start) as usize;
            let remaining = buffer.len() - total;

            let wanted = ((skip + remaining) as u64).div_ceil(align) * align;
            let span = wanted
                .min(self.buffer_size as u64)
                .min(length - unit_start) as usize;

            let plain = self.decode_span(unit_start, span)?;
            let n = (span - skip).min(remaining);
            buffer[total..total + n].copy_from_slice(&plain[skip..skip + n]);
            total += n;
            self.position = pos + n as u64;
        }

        self.seek_to(self.position)?;
        Ok(total)
    }

    /// Decode logical `[start, start + len)`. `start` is align-aligned.
    fn decode_span(&mut self, start: u64, len: usize) -> Result<Vec<u8>, StreamError> {
        let physical_start = self.physical_of(start);
        let physical_len = (self.physical_of(start + len as u64) - physical_start) as usize;

        self.base.set_position(physical_start)?;
        let mut raw = vec![0u8; physical_len];
        let base = &mut self.base;
        let got = self.stage_times.time(Stage::Read, || read_fully(base, &mut raw))?;
        if got < physical_len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes at offset {}, got {}", physical_len, physical_start, got),
            )
            .into());
        }

        self.transformer.sync_counter(start)?;
        let mut plain = vec![0u8; len];
        let mut hashes: Vec<&[u8]> = Vec::new();

        if self.integrity.has_hashes() {
            let chunk_size = self.integrity.chunk_size();
            let hash_size = self.integrity.hash_size();
            let first_chunk = start / chunk_size as u64;
            hashes = self.integrity.get_hashes(&raw, first_chunk)?;
            for (unit, out) in raw.chunks(chunk_size + hash_size).zip(plain.chunks_mut(chunk_size)) {
                let transformer = &mut self.transformer;
                self.stage_times
                    .time(Stage::Decrypt, || transformer.decrypt_block(&unit[hash_size..], out))?;
            }

            if self.integrity.is_enabled() {
                let prefix: Option<[u8; HEADER_LENGTH]> = match &self.header {
                    Some(h) if start == 0 => Some(*h.header_data()),
                    _ => None,
                };
                let integrity = &self.integrity;
                let plain_ref = &plain;
                self.stage_times.time(Stage::Verify, || {
                    integrity.verify_hashes(&hashes, plain_ref, prefix.as_ref().map(|p| p.as_slice()), first_chunk)
                })?;
            }
            self.counters.add_hashes(hashes.len(), hash_size);
        } else {
            let transformer = &mut self.transformer;
            self.stage_times
                .time(Stage::Decrypt, || transformer.decrypt_block(&raw, &mut plain))?;
        }

        let chunks = if hashes.is_empty() { 1 } else { hashes.len() };
        self.counters.add_data(chunks, len, len);
        Ok(plain)
    }

    /// A base stream ending inside a hash block lost the data of its last chunk.
    pub(crate) fn check_trailing_hash(&self) -> Result<(), StreamError> {
        if !self.integrity.is_enabled() {
            return Ok(());
        }
        let body = self.base.length()?.saturating_sub(self.header_len() as u64);
        let stride = (self.integrity.chunk_size() + self.integrity.hash_size()) as u64;
        let rem = body % stride;
        if rem > 0 && rem <= self.integrity.hash_size() as u64 {
            return Err(IntegrityError::TruncatedChunk { chunk: body / stride }.into());
        }
        Ok(())
    }
}
