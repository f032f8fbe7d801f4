// ## 📂 File: `src/crypto/types.rs`

use thiserror::Error;

/// Credential and cipher-setup failures. Never retryable with the same input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    #[error("invalid hash key length: expected={expected}, actual={actual}")]
    InvalidHashKeyLength { expected: usize, actual: usize },

    #[error("nonce is missing")]
    MissingNonce,

    #[error("hash key is missing while integrity is enabled")]
    MissingHashKey,

    #[error("transformer is not initialized")]
    NotInitialized,

    #[error("cipher initialization failed: {0}")]
    Cipher(String),
}

/// Counter or nonce space exhausted. Permanent for the key/nonce pair.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeExceededError {
    /// Increasing the counter would carry into the nonce prefix.
    #[error("counter exhausted: cannot advance {requested} blocks past block {block}")]
    CounterExhausted { block: u64, requested: u64 },

    /// Sequential nonce went past the end of its range.
    #[error("nonce range exhausted")]
    NonceExhausted,

    /// A nonce range is too small to split and delegate.
    #[error("nonce range too small to split: {available} < {min}")]
    NonceRangeTooSmall { available: u64, min: u64 },
}
