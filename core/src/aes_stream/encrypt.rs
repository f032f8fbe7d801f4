//! aes_stream/encrypt.rs
//! Write path: encrypt, hash and interleave `[hash | ciphertext]` per chunk.

use crate::aes_stream::core::AesStream;
use crate::constants::HEADER_LENGTH;
use crate::streams::RandomAccessStream;
use crate::telemetry::Stage;
use crate::types::{EncryptionMode, StreamError};

impl<S: RandomAccessStream> AesStream<S> {
    /// Encrypt `buffer` at the current logical position.
    ///
    /// The position must sit on an align boundary (chunk or block). Data is processed in
    /// `buffer_size` batches, each a whole number of chunks except possibly the last one.
    pub fn write(&mut self, buffer: &[u8]) -> Result<(), StreamError> {
        self.ensure_open()?;
        if self.mode != EncryptionMode::Encrypt {
            return Err(StreamError::Validation("stream is not in encrypt mode".into()));
        }
        let align = self.align_size() as u64;
        if self.position % align != 0 {
            return Err(StreamError::Validation(format!(
                "write position {} is not aligned to {} bytes",
                self.position, align
            )));
        }

        for batch in buffer.chunks(self.buffer_size) {
            self.write_batch(batch)?;
        }
        Ok(())
    }

    fn write_batch(&mut self, plain: &[u8]) -> Result<(), StreamError> {
        self.transformer.sync_counter(self.position)?;

        let mut cipher = vec![0u8; plain.len()];
        let transformer = &mut self.transformer;
        self.stage_times
            .time(Stage::Encrypt, || transformer.encrypt_block(plain, &mut cipher))?;

        // The header is bound into the first chunk's hash.
        let prefix: Option<[u8; HEADER_LENGTH]> = match &self.header {
            Some(h) if self.position == 0 => Some(*h.header_data()),
            _ => None,
        };
        let integrity = &self.integrity;
        let hashes = self.stage_times.time(Stage::Hash, || {
            integrity.generate_hashes(plain, prefix.as_ref().map(|p| p.as_slice()))
        })?;

        let physical = if hashes.is_empty() {
            cipher
        } else {
            let chunk_size = self.integrity.chunk_size();
            let mut out = Vec::with_capacity(plain.len() + hashes.len() * self.integrity.hash_size());
            for (hash, chunk) in hashes.iter().zip(cipher.chunks(chunk_size)) {
                out.extend_from_slice(hash);
                out.extend_from_slice(chunk);
            }
            out
        };

        let base = &mut self.base;
        self.stage_times.time(Stage::Write, || base.write(&physical))?;

        let chunks = if hashes.is_empty() { 1 } else { hashes.len() };
        self.counters.add_data(chunks, plain.len(), plain.len());
        self.counters.add_hashes(hashes.len(), self.integrity.hash_size());
        self.position += plain.len() as u64;
        Ok(())
    }
}
