use thiserror::Error;

/// Chunk integrity failures. A mismatch means tampering or corruption of that chunk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("hash mismatch at chunk {chunk}")]
    HashMismatch { chunk: u64 },

    #[error("chunk {chunk} is truncated inside its hash block")]
    TruncatedChunk { chunk: u64 },

    #[error("expected {expected} hashes, got {actual}")]
    HashCount { expected: usize, actual: usize },

    #[error("invalid chunk size {size}: must be 0 or a positive multiple of {block} up to {max}")]
    InvalidChunkSize { size: usize, block: usize, max: usize },

    #[error("integrity verification requested but the stream carries no hashes")]
    NotAvailable,

    #[error("hash provider failure: {0}")]
    Provider(String),
}
