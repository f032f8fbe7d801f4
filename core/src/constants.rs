//! constants.rs
//! Fixed sizes shared by the transformer, integrity engine, header codec and streams.
//!
//! All of these are part of the wire contract. Changing any of them changes the
//! physical layout of every stream produced by this crate.

/// AES block size in bytes. Also the CTR counter width.
pub const BLOCK_SIZE: usize = 16;

/// AES-256 key length.
pub const KEY_LENGTH: usize = 32;

/// Nonce length. The nonce occupies the high-order bytes of the counter.
pub const NONCE_LENGTH: usize = 8;

/// Integrity hash key length (HMAC-SHA256 / keyed BLAKE3).
pub const HASH_KEY_LENGTH: usize = 32;

/// Output size of the bundled hash providers.
pub const HASH_RESULT_LENGTH: usize = 32;

/// Header magic marker.
pub const MAGIC_BYTES: [u8; 3] = *b"SLM";
pub const MAGIC_LENGTH: usize = MAGIC_BYTES.len();

/// Current header version.
pub const VERSION: u8 = 2;
pub const VERSION_LENGTH: usize = 1;

/// Width of the chunk size field in the header (u32, big-endian).
pub const CHUNK_SIZE_LENGTH: usize = 4;

/// Fixed header size in bytes: magic + version + chunk size + nonce.
pub const HEADER_LENGTH: usize = MAGIC_LENGTH + VERSION_LENGTH + CHUNK_SIZE_LENGTH + NONCE_LENGTH;

/// Chunk size used when integrity is requested without an explicit size.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024; // 256 KiB

/// Upper bound for a chunk size (8 MiB).
pub const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Default buffer size for stream reads/writes and stream copies.
pub const DEFAULT_BUFFER_SIZE: usize = 256 * 1024; // 256 KiB

/// Smallest nonce range that may be split and delegated.
pub const MIN_NONCE_RANGE: u64 = 256;

/// Highest nonce value handed out by default (signed 64-bit range).
pub const DEFAULT_MAX_NONCE: u64 = i64::MAX as u64;
