//! integrity/engine.rs
//! Per-chunk keyed hashes and logical <-> physical length arithmetic.
//!
//! Physical layout with integrity (chunk size `C`, hash size `H`):
//! `[header][H | C bytes][H | C bytes]...[H | <=C bytes]`
//!
//! Contract:
//! - Hashes cover the plaintext of each chunk. The first chunk of a stream is hashed as
//!   `header || chunk` when a header exists, binding the header into the envelope.
//! - A trailing chunk shorter than `C` still carries exactly one hash.
//! - Verification is fail-fast: the first mismatching chunk aborts with its index.

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::constants::{BLOCK_SIZE, DEFAULT_CHUNK_SIZE, HASH_KEY_LENGTH, MAX_CHUNK_SIZE};
use crate::crypto::SecurityError;
use crate::integrity::provider::{HashProvider, HmacSha256Provider};
use crate::integrity::types::IntegrityError;
use crate::types::{EncryptionMode, StreamError};
use crate::utils::constant_time_eq;

/// Chunk size must be 0 (no integrity) or a positive multiple of the block size up to the max.
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), IntegrityError> {
    if chunk_size % BLOCK_SIZE != 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(IntegrityError::InvalidChunkSize {
            size: chunk_size,
            block: BLOCK_SIZE,
            max: MAX_CHUNK_SIZE,
        });
    }
    Ok(())
}

/// Bytes of hash overhead contained in `length`.
///
/// - Decrypt mode: `length` is physical (header excluded), stride is `chunk_size + hash_offset`.
/// - Encrypt mode: `length` is logical, stride is `chunk_size`.
///
/// A partial trailing stride counts as one more chunk only if it is longer than `hash_offset`.
pub fn total_hash_data_length(
    mode: EncryptionMode,
    length: u64,
    chunk_size: usize,
    hash_offset: usize,
    hash_length: usize,
) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    let stride = match mode {
        EncryptionMode::Decrypt => (chunk_size + hash_offset) as u64,
        EncryptionMode::Encrypt => chunk_size as u64,
    };
    let mut chunks = length / stride;
    if length % stride > hash_offset as u64 {
        chunks += 1;
    }
    chunks * hash_length as u64
}

/// Physical offset of logical byte `logical`.
///
/// At a chunk boundary this is the start of that chunk's hash block.
pub fn logical_to_physical(logical: u64, chunk_size: usize, hash_size: usize, header_len: usize) -> u64 {
    header_len as u64
        + logical
        + total_hash_data_length(EncryptionMode::Encrypt, logical, chunk_size, 0, hash_size)
}

/// Logical offset of physical byte `physical`.
///
/// Positions inside the header or a hash block map to the start of the following data.
pub fn physical_to_logical(physical: u64, chunk_size: usize, hash_size: usize, header_len: usize) -> u64 {
    let body = physical.saturating_sub(header_len as u64);
    if chunk_size == 0 {
        return body;
    }
    let stride = (chunk_size + hash_size) as u64;
    let full = body / stride;
    let rem = body % stride;
    full * chunk_size as u64 + rem.saturating_sub(hash_size as u64)
}

/// Integrity engine for one stream or parallel operation.
#[derive(Clone)]
pub struct Integrity {
    enabled: bool,
    hash_key: Option<Arc<Zeroizing<Vec<u8>>>>,
    chunk_size: usize,
    hash_size: usize,
    provider: Arc<dyn HashProvider>,
}

impl fmt::Debug for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integrity")
            .field("enabled", &self.enabled)
            .field("chunk_size", &self.chunk_size)
            .field("hash_size", &self.hash_size)
            .finish_non_exhaustive()
    }
}

impl Integrity {
    /// Build an engine.
    ///
    /// - `enabled` requires a `HASH_KEY_LENGTH` hash key; chunk size 0 then means the default.
    /// - `enabled == false` with a non-zero chunk size describes a hashed layout whose hashes
    ///   are skipped rather than verified.
    pub fn new(
        enabled: bool,
        hash_key: Option<&[u8]>,
        chunk_size: usize,
        provider: Arc<dyn HashProvider>,
    ) -> Result<Self, StreamError> {
        validate_chunk_size(chunk_size)?;

        let mut chunk_size = chunk_size;
        let hash_key = if enabled {
            let key = hash_key.ok_or(SecurityError::MissingHashKey)?;
            if key.len() != HASH_KEY_LENGTH {
                return Err(SecurityError::InvalidHashKeyLength {
                    expected: HASH_KEY_LENGTH,
                    actual: key.len(),
                }
                .into());
            }
            if chunk_size == 0 {
                chunk_size = DEFAULT_CHUNK_SIZE;
            }
            Some(Arc::new(Zeroizing::new(key.to_vec())))
        } else {
            None
        };

        let hash_size = provider.hash_size();
        Ok(Self { enabled, hash_key, chunk_size, hash_size, provider })
    }

    /// No hashes, no verification.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            hash_key: None,
            chunk_size: 0,
            hash_size: HmacSha256Provider.hash_size(),
            provider: Arc::new(HmacSha256Provider),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the physical layout interleaves hash blocks.
    pub fn has_hashes(&self) -> bool {
        self.chunk_size > 0
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn hash_size(&self) -> usize {
        self.hash_size
    }

    pub fn hash_key(&self) -> Option<&[u8]> {
        self.hash_key.as_ref().map(|k| k.as_slice())
    }

    pub fn provider(&self) -> &Arc<dyn HashProvider> {
        &self.provider
    }

    /// Hash over `prefix || buffer` with this engine's key.
    pub fn calculate_hash(&self, buffer: &[u8], prefix: Option<&[u8]>) -> Result<Vec<u8>, StreamError> {
        let key = self.hash_key().ok_or(SecurityError::MissingHashKey)?;
        Ok(self.provider.calc(key, prefix, buffer)?)
    }

    /// One hash per chunk of `buffer`; the first chunk is prefixed with `header` if given.
    /// Empty when integrity is disabled.
    pub fn generate_hashes(&self, buffer: &[u8], header: Option<&[u8]>) -> Result<Vec<Vec<u8>>, StreamError> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        buffer
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(i, chunk)| self.calculate_hash(chunk, if i == 0 { header } else { None }))
            .collect()
    }

    /// Recompute and compare per chunk. `first_chunk` is the stream-wide index of the first
    /// chunk in `buffer`, used only for error reporting.
    pub fn verify_hashes(
        &self,
        hashes: &[&[u8]],
        buffer: &[u8],
        header: Option<&[u8]>,
        first_chunk: u64,
    ) -> Result<(), StreamError> {
        if !self.enabled {
            return Ok(());
        }
        let expected = buffer.len().div_ceil(self.chunk_size);
        if hashes.len() != expected {
            return Err(IntegrityError::HashCount { expected, actual: hashes.len() }.into());
        }
        for (i, (chunk, stored)) in buffer.chunks(self.chunk_size).zip(hashes).enumerate() {
            let computed = self.calculate_hash(chunk, if i == 0 { header } else { None })?;
            if !constant_time_eq(&computed, stored) {
                return Err(IntegrityError::HashMismatch { chunk: first_chunk + i as u64 }.into());
            }
        }
        Ok(())
    }

    /// Stored hash of each `[hash | data]` unit in `physical`, in order.
    ///
    /// `physical` starts on a unit boundary; `first_chunk` is its stream-wide chunk index.
    /// A unit holding no data past its hash is `TruncatedChunk`. Empty without a hashed layout.
    pub fn get_hashes<'a>(&self, physical: &'a [u8], first_chunk: u64) -> Result<Vec<&'a [u8]>, IntegrityError> {
        if !self.has_hashes() {
            return Ok(Vec::new());
        }
        physical
            .chunks(self.chunk_size + self.hash_size)
            .enumerate()
            .map(|(i, unit)| {
                if unit.len() <= self.hash_size {
                    return Err(IntegrityError::TruncatedChunk { chunk: first_chunk + i as u64 });
                }
                Ok(&unit[..self.hash_size])
            })
            .collect()
    }

    /// Hash overhead in `length` (logical in encrypt mode, physical in decrypt mode).
    pub fn hash_data_length(&self, mode: EncryptionMode, length: u64) -> u64 {
        let offset = match mode {
            EncryptionMode::Encrypt => 0,
            EncryptionMode::Decrypt => self.hash_size,
        };
        total_hash_data_length(mode, length, self.chunk_size, offset, self.hash_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: usize = 64;
    const H: usize = 32;

    fn engine() -> Integrity {
        Integrity::new(true, Some(&[3u8; 32]), C, Arc::new(HmacSha256Provider)).unwrap()
    }

    #[test]
    fn encrypt_accounting_rounds_up_partial_chunks() {
        assert_eq!(total_hash_data_length(EncryptionMode::Encrypt, 0, C, 0, H), 0);
        assert_eq!(total_hash_data_length(EncryptionMode::Encrypt, 64, C, 0, H), 32);
        assert_eq!(total_hash_data_length(EncryptionMode::Encrypt, 65, C, 0, H), 64);
    }

    #[test]
    fn decrypt_accounting_needs_more_than_a_hash() {
        let stride = (C + H) as u64;
        assert_eq!(total_hash_data_length(EncryptionMode::Decrypt, stride, C, H, H), 32);
        assert_eq!(total_hash_data_length(EncryptionMode::Decrypt, stride + 32, C, H, H), 32);
        assert_eq!(total_hash_data_length(EncryptionMode::Decrypt, stride + 33, C, H, H), 64);
    }

    #[test]
    fn position_mapping_round_trips() {
        for logical in [0u64, 1, 63, 64, 65, 128, 1000] {
            let physical = logical_to_physical(logical, C, H, 16);
            assert_eq!(physical_to_logical(physical, C, H, 16), logical, "logical {}", logical);
        }
        // start of chunk 1 sits on its hash block
        assert_eq!(logical_to_physical(64, C, H, 16), 16 + 96);
        // inside a hash block maps to the chunk start
        assert_eq!(physical_to_logical(16 + 96 + 10, C, H, 16), 64);
        assert_eq!(logical_to_physical(10, 0, H, 16), 26);
    }

    #[test]
    fn chunk_size_validation() {
        assert!(validate_chunk_size(0).is_ok());
        assert!(validate_chunk_size(16).is_ok());
        assert!(validate_chunk_size(MAX_CHUNK_SIZE).is_ok());
        assert!(validate_chunk_size(17).is_err());
        assert!(validate_chunk_size(MAX_CHUNK_SIZE + 16).is_err());
    }

    #[test]
    fn enabled_requires_key_and_defaults_chunk() {
        let err = Integrity::new(true, None, 0, Arc::new(HmacSha256Provider)).unwrap_err();
        assert!(err.is_security());
        let err = Integrity::new(true, Some(&[1u8; 5]), 0, Arc::new(HmacSha256Provider)).unwrap_err();
        assert!(err.is_security());
        let i = Integrity::new(true, Some(&[1u8; 32]), 0, Arc::new(HmacSha256Provider)).unwrap();
        assert_eq!(i.chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn generate_then_verify() {
        let i = engine();
        let data: Vec<u8> = (0..200u32).map(|x| x as u8).collect();
        let hashes = i.generate_hashes(&data, Some(b"hdr")).unwrap();
        assert_eq!(hashes.len(), 4);
        let refs: Vec<&[u8]> = hashes.iter().map(|h| h.as_slice()).collect();
        i.verify_hashes(&refs, &data, Some(b"hdr"), 0).unwrap();

        // header binding: dropping the prefix breaks chunk 0 only
        let err = i.verify_hashes(&refs, &data, None, 0).unwrap_err();
        assert!(matches!(err, StreamError::Integrity(IntegrityError::HashMismatch { chunk: 0 })));
    }

    #[test]
    fn verify_fails_fast_at_first_bad_chunk() {
        let i = engine();
        let mut data = vec![7u8; 256];
        let hashes = i.generate_hashes(&data, None).unwrap();
        let refs: Vec<&[u8]> = hashes.iter().map(|h| h.as_slice()).collect();
        data[130] ^= 1;
        data[250] ^= 1;
        let err = i.verify_hashes(&refs, &data, None, 10).unwrap_err();
        assert!(matches!(err, StreamError::Integrity(IntegrityError::HashMismatch { chunk: 12 })));
    }

    #[test]
    fn disabled_engine_is_inert() {
        let i = Integrity::disabled();
        assert!(!i.has_hashes());
        assert!(i.generate_hashes(b"abc", None).unwrap().is_empty());
        assert_eq!(i.hash_data_length(EncryptionMode::Encrypt, 1 << 20), 0);
        assert!(i.get_hashes(&[0u8; 100], 0).unwrap().is_empty());
    }

    #[test]
    fn hash_data_length_per_mode() {
        let i = engine();
        assert_eq!(i.hash_data_length(EncryptionMode::Encrypt, 65), 2 * H as u64);
        assert_eq!(i.hash_data_length(EncryptionMode::Decrypt, (C + H) as u64 + 32), H as u64);
        assert_eq!(i.hash_data_length(EncryptionMode::Decrypt, (C + H) as u64 + 33), 2 * H as u64);
    }

    #[test]
    fn hashes_are_read_at_unit_stride() {
        let i = engine();
        // two full units and a short third one
        let mut physical = Vec::new();
        for (tag, len) in [(1u8, C), (2, C), (3, 5)] {
            physical.extend_from_slice(&[tag; H]);
            physical.extend(std::iter::repeat(0xEE).take(len));
        }
        let hashes = i.get_hashes(&physical, 7).unwrap();
        assert_eq!(hashes.len(), 3);
        for (n, h) in hashes.iter().enumerate() {
            assert_eq!(*h, &[n as u8 + 1; H][..]);
        }

        // a trailing unit cut inside its hash lost its data
        let cut = &physical[..2 * (C + H) + H];
        assert!(matches!(i.get_hashes(cut, 7), Err(IntegrityError::TruncatedChunk { chunk: 9 })));
    }
}
