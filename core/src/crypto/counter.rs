//! crypto/counter.rs
//! Counter and nonce bookkeeping shared by every CTR backend.
//!
//! Design:
//! - The 16-byte counter starts as `nonce || 0^8`. Only the low `BLOCK_SIZE - NONCE_LENGTH`
//!   bytes vary per block; a carry into the nonce prefix is `RangeExceeded`, never a wrap.
//! - The counter only ever counts plaintext AES blocks. Header and hash overhead are
//!   excluded, so `sync_counter(logical_position)` is the only way to move it backwards.
//! - Backends compute their keystream from `counter()` and then call `commit(blocks)`.

use zeroize::{Zeroize, Zeroizing};

use crate::constants::{BLOCK_SIZE, KEY_LENGTH, NONCE_LENGTH};
use crate::crypto::types::{RangeExceededError, SecurityError};

/// Add `value` to a big-endian counter, propagating carry byte by byte from the
/// least significant byte. Fails if the carry would reach the nonce prefix.
pub fn add_to_counter(
    counter: &[u8; BLOCK_SIZE],
    value: u64,
) -> Result<[u8; BLOCK_SIZE], RangeExceededError> {
    let mut next = *counter;
    let mut carry = value;
    for index in (NONCE_LENGTH..BLOCK_SIZE).rev() {
        if carry == 0 {
            break;
        }
        let sum = next[index] as u64 + (carry & 0xFF);
        next[index] = sum as u8;
        carry = (carry >> 8) + (sum >> 8);
    }
    if carry > 0 {
        return Err(RangeExceededError::CounterExhausted {
            block: counter_block(counter),
            requested: value,
        });
    }
    Ok(next)
}

/// Per-block part of a counter (the bytes after the nonce prefix).
fn counter_block(counter: &[u8; BLOCK_SIZE]) -> u64 {
    counter[NONCE_LENGTH..]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

/// Number of AES blocks touched by `len` bytes.
#[inline]
pub fn blocks_for(len: usize) -> u64 {
    len.div_ceil(BLOCK_SIZE) as u64
}

/// Key, nonce, running counter and block index for one transformer.
#[derive(Default)]
pub struct CounterState {
    key: Option<Zeroizing<[u8; KEY_LENGTH]>>,
    nonce: Option<[u8; NONCE_LENGTH]>,
    counter: [u8; BLOCK_SIZE],
    block: u64,
}

impl CounterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store key and nonce and reset the counter.
    pub fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<(), SecurityError> {
        let key: [u8; KEY_LENGTH] =
            key.try_into().map_err(|_| SecurityError::InvalidKeyLength {
                expected: KEY_LENGTH,
                actual: key.len(),
            })?;
        let nonce: [u8; NONCE_LENGTH] =
            nonce.try_into().map_err(|_| SecurityError::InvalidNonceLength {
                expected: NONCE_LENGTH,
                actual: nonce.len(),
            })?;
        self.key = Some(Zeroizing::new(key));
        self.nonce = Some(nonce);
        self.reset_counter()
    }

    pub fn is_initialized(&self) -> bool {
        self.key.is_some() && self.nonce.is_some()
    }

    pub fn key(&self) -> Option<&[u8; KEY_LENGTH]> {
        self.key.as_deref()
    }

    pub fn nonce(&self) -> Option<&[u8; NONCE_LENGTH]> {
        self.nonce.as_ref()
    }

    pub fn counter(&self) -> &[u8; BLOCK_SIZE] {
        &self.counter
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    /// counter = nonce padded with zeros; block index = 0.
    pub fn reset_counter(&mut self) -> Result<(), SecurityError> {
        let nonce = self.nonce.ok_or(SecurityError::NotInitialized)?;
        if self.key.is_none() {
            return Err(SecurityError::NotInitialized);
        }
        self.counter = [0u8; BLOCK_SIZE];
        self.counter[..NONCE_LENGTH].copy_from_slice(&nonce);
        self.block = 0;
        Ok(())
    }

    /// Add `value` blocks to the counter. The block index is left untouched.
    pub fn increase_counter(&mut self, value: u64) -> Result<(), RangeExceededError> {
        self.counter = add_to_counter(&self.counter, value)?;
        Ok(())
    }

    /// Position the counter at the block holding logical byte `position`.
    pub fn sync_counter(&mut self, position: u64) -> Result<(), crate::types::StreamError> {
        let block = position / BLOCK_SIZE as u64;
        self.reset_counter()?;
        self.increase_counter(block)?;
        self.block = block;
        Ok(())
    }

    /// Check that `blocks` more blocks fit, without moving the counter.
    pub fn check_room(&self, blocks: u64) -> Result<(), RangeExceededError> {
        add_to_counter(&self.counter, blocks).map(|_| ())
    }

    /// Advance counter and block index after a backend consumed `blocks` blocks of keystream.
    pub fn commit(&mut self, blocks: u64) -> Result<(), RangeExceededError> {
        self.increase_counter(blocks)?;
        self.block += blocks;
        Ok(())
    }

    /// Wipe key and counter material.
    pub fn clear(&mut self) {
        self.key = None;
        if let Some(nonce) = self.nonce.as_mut() {
            nonce.zeroize();
        }
        self.nonce = None;
        self.counter.zeroize();
        self.block = 0;
    }
}

impl Drop for CounterState {
    fn drop(&mut self) {
        self.counter.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> CounterState {
        let mut s = CounterState::new();
        s.init(&[7u8; KEY_LENGTH], &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        s
    }

    #[test]
    fn reset_seeds_from_nonce() {
        let s = state();
        assert_eq!(&s.counter()[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&s.counter()[8..], &[0u8; 8]);
        assert_eq!(s.block(), 0);
    }

    #[test]
    fn reset_before_init_fails() {
        let mut s = CounterState::new();
        assert_eq!(s.reset_counter(), Err(SecurityError::NotInitialized));
    }

    #[test]
    fn sync_counter_sets_block_index() {
        let mut s = state();
        s.sync_counter(16 * 300 + 5).unwrap();
        assert_eq!(s.block(), 300);
        assert_eq!(&s.counter()[14..], &[0x01, 0x2C]);
    }

    #[test]
    fn commit_moves_counter_and_block() {
        let mut s = state();
        s.commit(3).unwrap();
        assert_eq!(s.block(), 3);
        assert_eq!(s.counter()[15], 3);
    }

    #[test]
    fn clear_wipes_key() {
        let mut s = state();
        s.clear();
        assert!(!s.is_initialized());
        assert!(s.key().is_none());
    }
}
