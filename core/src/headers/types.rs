// ## 📂 File: `src/headers/types.rs`

//! headers/types.rs
//! Header value object and header errors.
//!
//! Layout (16 bytes, big-endian):
//! - 0..3   magic `b"SLM"`
//! - 3..4   version
//! - 4..8   chunk size (0 = no integrity)
//! - 8..16  nonce
//!
//! The raw bytes are kept alongside the parsed fields: they are the integrity prefix of
//! the first chunk.

use std::fmt;

use crate::constants::{HEADER_LENGTH, MAGIC_BYTES, MAGIC_LENGTH, NONCE_LENGTH, VERSION};
use crate::headers::encode::encode_header;
use crate::utils::fmt_bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub(crate) magic: [u8; MAGIC_LENGTH],
    pub(crate) version: u8,
    pub(crate) chunk_size: u32,
    pub(crate) nonce: [u8; NONCE_LENGTH],
    pub(crate) raw: [u8; HEADER_LENGTH],
}

impl Header {
    pub const LEN: usize = HEADER_LENGTH;

    /// Current-version header for `nonce` and `chunk_size`.
    pub fn new(nonce: [u8; NONCE_LENGTH], chunk_size: u32) -> Self {
        let mut h = Self {
            magic: MAGIC_BYTES,
            version: VERSION,
            chunk_size,
            nonce,
            raw: [0u8; HEADER_LENGTH],
        };
        h.raw = encode_header(&h);
        h
    }

    pub fn magic(&self) -> &[u8; MAGIC_LENGTH] {
        &self.magic
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    /// Serialized form, exactly as stored in the stream.
    pub fn header_data(&self) -> &[u8; HEADER_LENGTH] {
        &self.raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Buffer too short to contain a header.
    BufferTooShort { have: usize, need: usize },

    /// Magic marker does not match.
    InvalidMagic { have: [u8; MAGIC_LENGTH], need: [u8; MAGIC_LENGTH] },

    /// Version this build cannot read.
    UnsupportedVersion { have: u8, need: u8 },

    /// Chunk size not a multiple of the block size, or too large.
    InvalidChunkSize { have: u32 },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HeaderError::*;
        match self {
            BufferTooShort { have, need } =>
                write!(f, "header buffer too short: {} < {}", have, need),
            InvalidMagic { have, need } =>
                write!(f, "invalid magic: expected {}, got {}", fmt_bytes(need), fmt_bytes(have)),
            UnsupportedVersion { have, need } =>
                write!(f, "unsupported version: {} (expected {})", have, need),
            InvalidChunkSize { have } =>
                write!(f, "invalid chunk size in header: {}", have),
        }
    }
}

impl std::error::Error for HeaderError {}
