use std::fmt;
use std::io;

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{RangeExceededError, SecurityError},
    headers::HeaderError,
    integrity::IntegrityError,
};

/// Direction of a stream or engine operation.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum EncryptionMode {
    Encrypt = 0x01,
    Decrypt = 0x02,
}

/// Physical format of an encrypted stream.
/// - `Salmon`: fixed header embedded at offset 0 (nonce and chunk size travel with the data).
/// - `Generic`: no header; nonce and chunk size are supplied by the caller on both sides.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum EncryptionFormat {
    Salmon = 0x01,
    Generic = 0x02,
}

impl EncryptionFormat {
    /// Whether the physical stream starts with the fixed header.
    pub fn has_header(self) -> bool {
        matches!(self, EncryptionFormat::Salmon)
    }
}

/// Unified stream error covering I/O, security, integrity, range, header and validation failures.
/// - Ergonomic `From<T>` impls enable `?` across transformer, integrity, header and stream layers.
/// - Security, integrity and range errors are permanent for the key/nonce/ciphertext they concern.
#[derive(Debug)]
pub enum StreamError {
    /// I/O error from the underlying stream, passed through unchanged.
    Io(io::Error),

    /// Missing/invalid key or nonce, cipher not initialized.
    Security(SecurityError),

    /// Stored hash does not match the recomputed hash of a chunk.
    Integrity(IntegrityError),

    /// Counter or nonce arithmetic left its addressable range.
    RangeExceeded(RangeExceededError),

    /// Header could not be parsed.
    Header(HeaderError),

    /// Operation stopped because a sibling worker failed.
    Cancelled,

    /// Operation on a stream after `close()`.
    Closed,

    /// A worker thread panicked before reporting a result.
    WorkerPanicked { segment: usize },

    /// Generic high-level validation with a descriptive message.
    Validation(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "I/O error: {}", e),
            StreamError::Security(e) => write!(f, "security error: {}", e),
            StreamError::Integrity(e) => write!(f, "integrity error: {}", e),
            StreamError::RangeExceeded(e) => write!(f, "range exceeded: {}", e),
            StreamError::Header(e) => write!(f, "header error: {}", e),
            StreamError::Cancelled => write!(f, "operation cancelled"),
            StreamError::Closed => write!(f, "stream is closed"),
            StreamError::WorkerPanicked { segment } => {
                write!(f, "worker for segment {} panicked", segment)
            }
            StreamError::Validation(msg) => write!(f, "validation error: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::Security(e) => Some(e),
            StreamError::Integrity(e) => Some(e),
            StreamError::RangeExceeded(e) => Some(e),
            StreamError::Header(e) => Some(e),
            _ => None,
        }
    }
}

impl StreamError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, StreamError::Integrity(_))
    }

    pub fn is_security(&self) -> bool {
        matches!(self, StreamError::Security(_))
    }

    pub fn is_range_exceeded(&self) -> bool {
        matches!(self, StreamError::RangeExceeded(_))
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<SecurityError> for StreamError {
    fn from(e: SecurityError) -> Self {
        StreamError::Security(e)
    }
}

impl From<IntegrityError> for StreamError {
    fn from(e: IntegrityError) -> Self {
        StreamError::Integrity(e)
    }
}

impl From<RangeExceededError> for StreamError {
    fn from(e: RangeExceededError) -> Self {
        StreamError::RangeExceeded(e)
    }
}

impl From<HeaderError> for StreamError {
    fn from(e: HeaderError) -> Self {
        StreamError::Header(e)
    }
}

/// Surface stream errors through `std::io::{Read, Write, Seek}`.
/// Plain I/O errors are unwrapped so callers see the original kind.
impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(inner) => inner,
            StreamError::Integrity(_) | StreamError::Header(_) => {
                io::Error::new(io::ErrorKind::InvalidData, e)
            }
            StreamError::Validation(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_decode() {
        assert_eq!(EncryptionMode::try_from(0x02u8).unwrap(), EncryptionMode::Decrypt);
        assert_eq!(EncryptionFormat::try_from(0x01u8).unwrap(), EncryptionFormat::Salmon);
        assert!(EncryptionFormat::try_from(0x7fu8).is_err());
    }

    #[test]
    fn io_kind_follows_error_class() {
        let e: io::Error = StreamError::Integrity(IntegrityError::HashMismatch { chunk: 1 }).into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
        let e: io::Error = StreamError::Validation("bad".into()).into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
        let e: io::Error = StreamError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")).into();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
    }
}
