// Nonce sequencing and byte-codec helpers.

#[cfg(test)]
mod tests {
    use ctrstream_core::constants::{MIN_NONCE_RANGE, NONCE_LENGTH};
    use ctrstream_core::convert::{to_bytes, to_long, to_long_le};
    use ctrstream_core::crypto::{generate_nonce, increase_nonce, split_nonce_range, RangeExceededError};
    use ctrstream_core::types::StreamError;

    fn nonce(v: u64) -> [u8; NONCE_LENGTH] {
        v.to_be_bytes()
    }

    #[test]
    fn sequence_walks_up_to_the_end() {
        let end = nonce(0x1_02);
        let mut cur = nonce(0x0_FE);
        let mut issued = Vec::new();
        while let Ok(next) = increase_nonce(&cur, &end) {
            issued.push(u64::from_be_bytes(next));
            cur = next;
        }
        assert_eq!(issued, vec![0xFF, 0x100, 0x101, 0x102]);
        assert!(matches!(
            increase_nonce(&cur, &end),
            Err(StreamError::RangeExceeded(RangeExceededError::NonceExhausted))
        ));
    }

    #[test]
    fn max_nonce_cannot_increase() {
        let max = nonce(u64::MAX);
        assert!(increase_nonce(&max, &max).unwrap_err().is_range_exceeded());
    }

    #[test]
    fn split_delegates_upper_half() {
        let start = nonce(1_000);
        let end = nonce(1_000 + 4 * MIN_NONCE_RANGE);
        let mid = split_nonce_range(&start, &end).unwrap();
        assert_eq!(u64::from_be_bytes(mid), 1_000 + 2 * MIN_NONCE_RANGE);

        // the delegated half can be split again, down to the minimum
        let again = split_nonce_range(&mid, &end).unwrap();
        assert_eq!(u64::from_be_bytes(again), 1_000 + 3 * MIN_NONCE_RANGE);
        assert!(split_nonce_range(&again, &nonce(u64::from_be_bytes(again) + 10)).is_err());
    }

    #[test]
    fn inverted_range_is_too_small() {
        let err = split_nonce_range(&nonce(500), &nonce(100)).unwrap_err();
        assert!(matches!(
            err,
            StreamError::RangeExceeded(RangeExceededError::NonceRangeTooSmall { available: 0, .. })
        ));
    }

    #[test]
    fn wrong_length_nonce_is_security_error() {
        assert!(increase_nonce(&[1, 2, 3], &nonce(10)).unwrap_err().is_security());
        assert!(split_nonce_range(&nonce(1), &[0u8; 9]).unwrap_err().is_security());
    }

    #[test]
    fn random_nonces_are_full_width() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), NONCE_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn byte_codec_matches_nonce_encoding() {
        let n = nonce(0x0102_0304_0506_0708);
        assert_eq!(to_bytes(0x0102_0304_0506_0708, 8).unwrap(), n.to_vec());
        assert_eq!(to_long(&n, 0, 8).unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(to_long(&n, 6, 2).unwrap(), 0x0708);
        assert_eq!(to_long_le(&n, 0, 2).unwrap(), 0x0201);
        assert!(to_long(&n, 7, 2).is_err());
    }
}
