//! Segment workers for the parallel engine.
//!
//! A segment is a contiguous, aligned logical byte range owned by one worker.
//! Segment workers:
//! - open their own `AesStream` (own transformer state, same key/nonce/header/integrity)
//! - process their range in increasing order, one buffer at a time
//! - poll the shared cancellation flag between buffers
//! - write only into their own region of the output

pub mod types;
pub mod encrypt;
pub mod decrypt;

pub use types::{SegmentContext, SegmentReport};

pub use encrypt::encrypt_segment;
pub use decrypt::decrypt_segment;
