//! crypto/transformer.rs
//! AES-256-CTR transformers behind one interface.
//!
//! Design:
//! - `CtrTransformer` is the seam: streams only ever talk to a `Box<dyn CtrTransformer>`.
//! - Each backend composes a `CounterState` for key/nonce/counter bookkeeping and only
//!   supplies keystream generation. The counter is advanced after the keystream is applied.
//! - CTR encryption and decryption are the same transform.
//!
//! Backends:
//! - `AesTransformer`: one `aes::Aes256` block encryption per counter value. The `aes`
//!   crate picks AES-NI/ARMv8 instructions at runtime when the CPU has them.
//! - `AesCtrTransformer`: batched keystream through `ctr::Ctr128BE<Aes256>`. The 128-bit
//!   big-endian increment matches `CounterState` because the counter never reaches the
//!   nonce prefix.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes256;
use ctr::cipher::{InnerIvInit, StreamCipher};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constants::{BLOCK_SIZE, NONCE_LENGTH};
use crate::crypto::counter::{add_to_counter, blocks_for, CounterState};
use crate::crypto::types::SecurityError;
use crate::types::StreamError;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Block-cipher backend selection. Passed explicitly in stream/engine configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    /// Block-at-a-time AES with runtime hardware detection.
    #[default]
    Aes,
    /// Batched keystream via the `ctr` crate.
    AesCtr,
}

/// Build a fresh, uninitialized transformer for `provider`.
pub fn create_transformer(provider: ProviderType) -> Box<dyn CtrTransformer> {
    match provider {
        ProviderType::Aes => Box::new(AesTransformer::new()),
        ProviderType::AesCtr => Box::new(AesCtrTransformer::new()),
    }
}

/// CTR-mode transformer contract.
///
/// Contract:
/// - `init` must succeed before any other operation; otherwise `SecurityError::NotInitialized`.
/// - `encrypt_block`/`decrypt_block` transform `src` into `dst[..src.len()]` starting at the
///   current counter and advance the counter by one per (possibly partial) AES block.
///   Partial trailing blocks still consume a whole counter value; callers re-sync
///   with `sync_counter` before the next unaligned operation.
/// - If the data would need counter values past the nonce prefix, nothing is written and
///   `RangeExceeded` is returned.
pub trait CtrTransformer: Send {
    fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<(), SecurityError>;

    /// Apply the keystream to `src`, writing into `dst`. Returns bytes transformed.
    fn encrypt_block(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, StreamError>;

    fn decrypt_block(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, StreamError> {
        self.encrypt_block(src, dst)
    }

    fn state(&self) -> &CounterState;
    fn state_mut(&mut self) -> &mut CounterState;

    fn counter(&self) -> &[u8; BLOCK_SIZE] {
        self.state().counter()
    }

    fn block(&self) -> u64 {
        self.state().block()
    }

    fn nonce(&self) -> Option<&[u8; NONCE_LENGTH]> {
        self.state().nonce()
    }

    fn reset_counter(&mut self) -> Result<(), SecurityError> {
        self.state_mut().reset_counter()
    }

    fn increase_counter(&mut self, value: u64) -> Result<(), StreamError> {
        if !self.state().is_initialized() {
            return Err(SecurityError::NotInitialized.into());
        }
        Ok(self.state_mut().increase_counter(value)?)
    }

    fn sync_counter(&mut self, position: u64) -> Result<(), StreamError> {
        self.state_mut().sync_counter(position)
    }

    /// Wipe key material. The transformer must be re-initialized before reuse.
    fn close(&mut self);
}

fn check_buffers(src: &[u8], dst: &[u8]) -> Result<(), StreamError> {
    if dst.len() < src.len() {
        return Err(StreamError::Validation(format!(
            "output buffer too small: {} < {}",
            dst.len(),
            src.len()
        )));
    }
    Ok(())
}

fn new_cipher(state: &CounterState) -> Result<Aes256, SecurityError> {
    let key = state.key().ok_or(SecurityError::NotInitialized)?;
    Aes256::new_from_slice(key).map_err(|e| SecurityError::Cipher(e.to_string()))
}

// -----------------------------------------------------------------------------
// Block-at-a-time backend
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct AesTransformer {
    state: CounterState,
    cipher: Option<Aes256>,
}

impl AesTransformer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CtrTransformer for AesTransformer {
    fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<(), SecurityError> {
        self.state.init(key, nonce)?;
        self.cipher = Some(new_cipher(&self.state)?);
        Ok(())
    }

    fn encrypt_block(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, StreamError> {
        check_buffers(src, dst)?;
        let cipher = self.cipher.as_ref().ok_or(SecurityError::NotInitialized)?;
        let blocks = blocks_for(src.len());
        self.state.check_room(blocks)?;

        let mut counter = *self.state.counter();
        for (src_block, dst_block) in src.chunks(BLOCK_SIZE).zip(dst.chunks_mut(BLOCK_SIZE)) {
            let mut keystream = GenericArray::clone_from_slice(&counter);
            cipher.encrypt_block(&mut keystream);
            for (i, byte) in src_block.iter().enumerate() {
                dst_block[i] = byte ^ keystream[i];
            }
            counter = add_to_counter(&counter, 1)?;
        }

        self.state.commit(blocks)?;
        Ok(src.len())
    }

    fn state(&self) -> &CounterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CounterState {
        &mut self.state
    }

    fn close(&mut self) {
        self.cipher = None;
        self.state.clear();
    }
}

// -----------------------------------------------------------------------------
// Batched keystream backend
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct AesCtrTransformer {
    state: CounterState,
    cipher: Option<Aes256>,
}

impl AesCtrTransformer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CtrTransformer for AesCtrTransformer {
    fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<(), SecurityError> {
        self.state.init(key, nonce)?;
        self.cipher = Some(new_cipher(&self.state)?);
        Ok(())
    }

    fn encrypt_block(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, StreamError> {
        check_buffers(src, dst)?;
        let cipher = self.cipher.as_ref().ok_or(SecurityError::NotInitialized)?;
        let blocks = blocks_for(src.len());
        self.state.check_room(blocks)?;

        let iv = GenericArray::clone_from_slice(self.state.counter());
        let mut keystream = Aes256Ctr::from_core(InnerIvInit::inner_iv_init(cipher.clone(), &iv));
        let out = &mut dst[..src.len()];
        out.copy_from_slice(src);
        keystream.apply_keystream(out);

        trace!(blocks, block = self.state.block(), "ctr keystream applied");
        self.state.commit(blocks)?;
        Ok(src.len())
    }

    fn state(&self) -> &CounterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CounterState {
        &mut self.state
    }

    fn close(&mut self) {
        self.cipher = None;
        self.state.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42; 32];
    const NONCE: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 9];

    fn ready(provider: ProviderType) -> Box<dyn CtrTransformer> {
        let mut t = create_transformer(provider);
        t.init(&KEY, &NONCE).unwrap();
        t
    }

    #[test]
    fn backends_produce_identical_keystream() {
        let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        let mut a = vec![0u8; data.len()];
        let mut b = vec![0u8; data.len()];
        ready(ProviderType::Aes).encrypt_block(&data, &mut a).unwrap();
        ready(ProviderType::AesCtr).encrypt_block(&data, &mut b).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, data);
    }

    #[test]
    fn decrypt_inverts_encrypt() {
        let data = b"sixteen byte blk and a tail".to_vec();
        let mut ct = vec![0u8; data.len()];
        let mut pt = vec![0u8; data.len()];
        let mut t = ready(ProviderType::Aes);
        t.encrypt_block(&data, &mut ct).unwrap();
        t.sync_counter(0).unwrap();
        t.decrypt_block(&ct, &mut pt).unwrap();
        assert_eq!(pt, data);
    }

    #[test]
    fn counter_advances_per_partial_block() {
        let mut t = ready(ProviderType::AesCtr);
        let mut out = [0u8; 17];
        t.encrypt_block(&[0u8; 17], &mut out).unwrap();
        assert_eq!(t.block(), 2);
        assert_eq!(t.counter()[15], 2);
    }

    #[test]
    fn uninitialized_transformer_is_rejected() {
        let mut t = create_transformer(ProviderType::Aes);
        let mut out = [0u8; 4];
        let err = t.encrypt_block(&[1, 2, 3, 4], &mut out).unwrap_err();
        assert!(err.is_security());
        assert!(t.reset_counter().is_err());
    }

    #[test]
    fn bad_key_and_nonce_lengths() {
        let mut t = create_transformer(ProviderType::Aes);
        assert!(matches!(
            t.init(&[0u8; 16], &NONCE),
            Err(SecurityError::InvalidKeyLength { expected: 32, actual: 16 })
        ));
        assert!(matches!(
            t.init(&KEY, &[0u8; 12]),
            Err(SecurityError::InvalidNonceLength { expected: 8, actual: 12 })
        ));
    }

    #[test]
    fn close_wipes_state() {
        let mut t = ready(ProviderType::Aes);
        t.close();
        assert!(t.state().key().is_none());
        let mut out = [0u8; 1];
        assert!(t.encrypt_block(&[0u8], &mut out).is_err());
    }
}
