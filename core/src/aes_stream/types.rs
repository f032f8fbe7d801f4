use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::constants::{HASH_RESULT_LENGTH, HEADER_LENGTH};
use crate::crypto::ProviderType;
use crate::integrity::{total_hash_data_length, HashProvider, HmacSha256Provider};
use crate::types::{EncryptionFormat, EncryptionMode};

/// Per-stream configuration.
///
/// Defaults: header-embedding format, integrity off, block-at-a-time AES backend,
/// HMAC-SHA256 hashes, default buffer size, no range writes.
#[derive(Clone)]
pub struct StreamOptions {
    pub format: EncryptionFormat,
    pub integrity: bool,
    pub hash_key: Option<Zeroizing<Vec<u8>>>,
    /// Integrity chunk size. `None`/0 selects the default when integrity is on.
    /// For header-less decryption this also describes the hashed layout.
    pub chunk_size: Option<usize>,
    pub provider: ProviderType,
    pub hash_provider: Arc<dyn HashProvider>,
    /// 0 selects the default; always rounded to the stream's align size.
    pub buffer_size: usize,
    pub allow_range_write: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            format: EncryptionFormat::Salmon,
            integrity: false,
            hash_key: None,
            chunk_size: None,
            provider: ProviderType::default(),
            hash_provider: Arc::new(HmacSha256Provider),
            buffer_size: 0,
            allow_range_write: false,
        }
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("format", &self.format)
            .field("integrity", &self.integrity)
            .field("chunk_size", &self.chunk_size)
            .field("provider", &self.provider)
            .field("buffer_size", &self.buffer_size)
            .field("allow_range_write", &self.allow_range_write)
            .finish_non_exhaustive()
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: EncryptionFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable integrity with `hash_key`.
    pub fn with_integrity(mut self, hash_key: &[u8]) -> Self {
        self.integrity = true;
        self.hash_key = Some(Zeroizing::new(hash_key.to_vec()));
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_provider(mut self, provider: ProviderType) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_hash_provider(mut self, hash_provider: Arc<dyn HashProvider>) -> Self {
        self.hash_provider = hash_provider;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_range_write(mut self, allow: bool) -> Self {
        self.allow_range_write = allow;
        self
    }

    pub(crate) fn requested_chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(0)
    }
}

/// Exact physical size for `length` logical bytes (encrypt), or logical size for `length`
/// physical bytes (decrypt), with the default hash size.
pub fn get_output_size(
    mode: EncryptionMode,
    length: u64,
    format: EncryptionFormat,
    chunk_size: usize,
) -> u64 {
    get_output_size_with_hash(mode, length, format, chunk_size, HASH_RESULT_LENGTH)
}

/// `get_output_size` for providers with a non-default hash size.
pub fn get_output_size_with_hash(
    mode: EncryptionMode,
    length: u64,
    format: EncryptionFormat,
    chunk_size: usize,
    hash_size: usize,
) -> u64 {
    let header = if format.has_header() { HEADER_LENGTH as u64 } else { 0 };
    match mode {
        EncryptionMode::Encrypt => {
            length + header + total_hash_data_length(mode, length, chunk_size, 0, hash_size)
        }
        EncryptionMode::Decrypt => {
            let body = length.saturating_sub(header);
            body - total_hash_data_length(mode, body, chunk_size, hash_size, hash_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_CHUNK_SIZE;

    #[test]
    fn output_size_matches_layout() {
        let len = 10 * 1024 * 1024 + 7;
        let chunks = (len as u64).div_ceil(DEFAULT_CHUNK_SIZE as u64);
        let enc = get_output_size(EncryptionMode::Encrypt, len, EncryptionFormat::Salmon, DEFAULT_CHUNK_SIZE);
        assert_eq!(enc, len + 16 + chunks * 32);
        let dec = get_output_size(EncryptionMode::Decrypt, enc, EncryptionFormat::Salmon, DEFAULT_CHUNK_SIZE);
        assert_eq!(dec, len);
    }

    #[test]
    fn output_size_without_integrity_or_header() {
        assert_eq!(get_output_size(EncryptionMode::Encrypt, 1_000_003, EncryptionFormat::Salmon, 0), 1_000_019);
        assert_eq!(get_output_size(EncryptionMode::Encrypt, 100, EncryptionFormat::Generic, 0), 100);
        assert_eq!(get_output_size(EncryptionMode::Decrypt, 16, EncryptionFormat::Salmon, 0), 0);
        assert_eq!(get_output_size(EncryptionMode::Encrypt, 0, EncryptionFormat::Salmon, 64), 16);
    }
}
