// CTR transformer and counter arithmetic: carry propagation, range limits,
// position sync and backend agreement.

#[cfg(test)]
mod tests {
    use aes::cipher::{BlockEncrypt, KeyInit};
    use aes::Aes256;

    use ctrstream_core::constants::BLOCK_SIZE;
    use ctrstream_core::crypto::{add_to_counter, create_transformer, CtrTransformer, ProviderType, RangeExceededError};
    use ctrstream_core::types::StreamError;

    const KEY: [u8; 32] = [0x11; 32];
    const NONCE: [u8; 8] = [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7];

    fn transformer(provider: ProviderType) -> Box<dyn CtrTransformer> {
        let mut t = create_transformer(provider);
        t.init(&KEY, &NONCE).unwrap();
        t
    }

    #[test]
    fn carry_crosses_byte_boundary() {
        let mut c = [0u8; BLOCK_SIZE];
        c[15] = 0xFF;
        let next = add_to_counter(&c, 1).unwrap();
        assert_eq!(next[15], 0x00);
        assert_eq!(next[14], 0x01);

        c[14] = 0xFF;
        let next = add_to_counter(&c, 1).unwrap();
        assert_eq!(&next[13..], &[0x01, 0x00, 0x00]);
    }

    #[test]
    fn carry_into_nonce_prefix_is_range_exceeded() {
        let mut c = [0u8; BLOCK_SIZE];
        c[8..].copy_from_slice(&[0xFF; 8]);
        assert!(matches!(
            add_to_counter(&c, 1),
            Err(RangeExceededError::CounterExhausted { .. })
        ));
        // The prefix itself is never touched.
        c[7] = 0x42;
        assert!(add_to_counter(&c, 1).is_err());
    }

    #[test]
    fn first_block_is_aes_of_nonce_counter() {
        let cipher = Aes256::new_from_slice(&KEY).unwrap();
        let mut block = [0u8; 16];
        block[..8].copy_from_slice(&NONCE);
        let mut ks = aes::Block::from(block);
        cipher.encrypt_block(&mut ks);

        for provider in [ProviderType::Aes, ProviderType::AesCtr] {
            let mut t = transformer(provider);
            let mut out = [0u8; 16];
            t.encrypt_block(&[0u8; 16], &mut out).unwrap();
            assert_eq!(&out[..], ks.as_slice(), "{:?}", provider);
        }
    }

    #[test]
    fn sync_counter_matches_sequential_keystream() {
        for provider in [ProviderType::Aes, ProviderType::AesCtr] {
            let zeros = vec![0u8; 16 * 40];
            let mut seq = vec![0u8; zeros.len()];
            transformer(provider).encrypt_block(&zeros, &mut seq).unwrap();

            let mut t = transformer(provider);
            t.sync_counter(16 * 17 + 3).unwrap();
            assert_eq!(t.block(), 17);
            let mut tail = vec![0u8; 16 * 23];
            t.encrypt_block(&zeros[..16 * 23], &mut tail).unwrap();
            assert_eq!(&tail[..], &seq[16 * 17..]);
            assert_eq!(t.block(), 40);
        }
    }

    #[test]
    fn exhausted_counter_refuses_to_encrypt() {
        let mut t = transformer(ProviderType::Aes);
        t.increase_counter(u64::MAX).unwrap();
        let mut out = [0u8; 16];
        let err = t.encrypt_block(&[0u8; 16], &mut out).unwrap_err();
        assert!(err.is_range_exceeded());
        assert_eq!(out, [0u8; 16]);
    }

    #[test]
    fn increase_past_range_is_an_error() {
        let mut t = transformer(ProviderType::AesCtr);
        t.increase_counter(u64::MAX).unwrap();
        assert!(matches!(t.increase_counter(1), Err(StreamError::RangeExceeded(_))));
    }

    #[test]
    fn reset_returns_to_nonce() {
        let mut t = transformer(ProviderType::Aes);
        t.increase_counter(1000).unwrap();
        t.reset_counter().unwrap();
        assert_eq!(&t.counter()[..8], &NONCE);
        assert_eq!(&t.counter()[8..], &[0u8; 8]);
        assert_eq!(t.block(), 0);
    }
}
