//! ctrstream-core
//!
//! AES-256-CTR stream encryption with chunked keyed-hash integrity, a seekable
//! stream over any random-access byte stream, and a parallel whole-buffer engine.
//! Pure Rust, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod convert;

// Building blocks
pub mod crypto;
pub mod integrity;
pub mod headers;
pub mod streams;
pub mod telemetry;

// Stream and engine layers
pub mod aes_stream;
pub mod engine;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::aes_stream::{get_output_size, AesStream, StreamOptions};
    pub use crate::crypto::{generate_nonce, increase_nonce, split_nonce_range, ProviderType};
    pub use crate::engine::{Decryptor, EngineConfig, Encryptor};
    pub use crate::headers::Header;
    pub use crate::integrity::{HashAlgorithm, IntegrityError};
    pub use crate::streams::{copy_to, IoStream, MemoryStream, RandomAccessStream};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{EncryptionFormat, EncryptionMode, StreamError};
}
