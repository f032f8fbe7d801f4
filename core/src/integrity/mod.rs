//! integrity: keyed per-chunk hashes interleaved with ciphertext.
//!
//! The engine is generic over a `HashProvider`; HMAC-SHA256 is the default.

pub mod types;
pub mod provider;
pub mod engine;

pub use types::*;
pub use provider::*;
pub use engine::*;
