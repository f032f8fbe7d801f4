//! aes_stream/mod.rs
//! Seekable AES-256-CTR stream with optional chunk integrity.
//!
//! Usage:
//! - `AesStream::new(key, Some(&nonce), EncryptionMode::Encrypt, MemoryStream::new(), opts)`
//!   then `write` plaintext and `close`/`into_inner` to collect the physical bytes.
//! - `AesStream::new(key, None, EncryptionMode::Decrypt, base, opts)` reads nonce and
//!   chunk size from the header and supports random access reads.

pub mod types;
pub mod core;
mod encrypt;
mod decrypt;

pub use types::*;
pub use self::core::AesStream;
