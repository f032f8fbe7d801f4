// ## 📂 File: `src/crypto/nonce.rs`

//! crypto/nonce.rs
//! Nonce issuance helpers: random generation, sequential increment and range bisection.
//!
//! Design:
//! - A nonce is 8 bytes, interpreted as a big-endian unsigned integer.
//! - A device owns a nonce range `[current, end]`; `increase_nonce` hands out the next value
//!   and `split_nonce_range` delegates the upper half of the range to another device.
//!
//! Security notes:
//! - Never reuse a nonce under the same key. These helpers only enforce range bounds;
//!   persisting the sequence is the caller's job.

use rand::RngCore;

use crate::constants::{MIN_NONCE_RANGE, NONCE_LENGTH};
use crate::crypto::types::{RangeExceededError, SecurityError};
use crate::types::StreamError;

fn nonce_value(nonce: &[u8]) -> Result<u64, SecurityError> {
    let bytes: [u8; NONCE_LENGTH] =
        nonce.try_into().map_err(|_| SecurityError::InvalidNonceLength {
            expected: NONCE_LENGTH,
            actual: nonce.len(),
        })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Fresh random nonce from the thread-local CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_LENGTH] {
    let mut nonce = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Return `start + 1`, failing when it passes `end` or overflows.
pub fn increase_nonce(start: &[u8], end: &[u8]) -> Result<[u8; NONCE_LENGTH], StreamError> {
    let current = nonce_value(start)?;
    let max = nonce_value(end)?;
    let next = current
        .checked_add(1)
        .filter(|n| *n <= max)
        .ok_or(RangeExceededError::NonceExhausted)?;
    Ok(next.to_be_bytes())
}

/// Midpoint of `[start, end]`, used as the first nonce of a delegated sub-range.
/// Ranges narrower than `MIN_NONCE_RANGE` cannot be split.
pub fn split_nonce_range(start: &[u8], end: &[u8]) -> Result<[u8; NONCE_LENGTH], StreamError> {
    let lo = nonce_value(start)?;
    let hi = nonce_value(end)?;
    let available = hi.saturating_sub(lo);
    if available < MIN_NONCE_RANGE {
        return Err(RangeExceededError::NonceRangeTooSmall {
            available,
            min: MIN_NONCE_RANGE,
        }
        .into());
    }
    Ok((lo + available / 2).to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_NONCE;

    #[test]
    fn increase_carries_across_bytes() {
        let next = increase_nonce(&[0, 0, 0, 0, 0, 0, 0, 0xFF], &DEFAULT_MAX_NONCE.to_be_bytes())
            .unwrap();
        assert_eq!(next, [0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn increase_stops_at_end() {
        let end = 10u64.to_be_bytes();
        assert!(increase_nonce(&9u64.to_be_bytes(), &end).is_ok());
        let err = increase_nonce(&10u64.to_be_bytes(), &end).unwrap_err();
        assert!(err.is_range_exceeded());
        let err = increase_nonce(&u64::MAX.to_be_bytes(), &u64::MAX.to_be_bytes()).unwrap_err();
        assert!(err.is_range_exceeded());
    }

    #[test]
    fn split_returns_midpoint() {
        let mid = split_nonce_range(&1000u64.to_be_bytes(), &2000u64.to_be_bytes()).unwrap();
        assert_eq!(u64::from_be_bytes(mid), 1500);
    }

    #[test]
    fn split_rejects_small_ranges() {
        let err = split_nonce_range(&0u64.to_be_bytes(), &255u64.to_be_bytes()).unwrap_err();
        assert!(err.is_range_exceeded());
        assert!(split_nonce_range(&0u64.to_be_bytes(), &256u64.to_be_bytes()).is_ok());
    }

    #[test]
    fn wrong_length_is_security_error() {
        let err = increase_nonce(&[1, 2, 3], &[0xFF; 8]).unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn generated_nonces_differ() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
