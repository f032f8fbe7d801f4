//! headers/mod.rs
//! Fixed 16-byte stream header: magic, version, chunk size, nonce.
//!
//! Notes:
//! - Big-endian throughout.
//! - The header is written once when an encrypting stream opens and read once when a
//!   decrypting stream opens; it is immutable afterwards.
//! - Its raw bytes prefix the first chunk's integrity hash.

pub mod types;
pub mod encode;
pub mod decode;
pub mod stream;

pub use types::*;
pub use encode::*;
pub use decode::*;
pub use stream::*;
