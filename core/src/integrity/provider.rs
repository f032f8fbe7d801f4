//! integrity/provider.rs
//! Pluggable keyed hash providers.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::{HASH_KEY_LENGTH, HASH_RESULT_LENGTH};
use crate::integrity::types::IntegrityError;

type HmacSha256 = Hmac<Sha256>;

/// Keyed hash over `prefix || buffer`.
///
/// Implementations must be deterministic and thread-safe; one provider instance is shared
/// by every worker of a parallel operation.
pub trait HashProvider: Send + Sync {
    fn calc(&self, key: &[u8], prefix: Option<&[u8]>, buffer: &[u8]) -> Result<Vec<u8>, IntegrityError>;

    /// Output length in bytes.
    fn hash_size(&self) -> usize;
}

/// HMAC-SHA256. The default provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct HmacSha256Provider;

impl HashProvider for HmacSha256Provider {
    fn calc(&self, key: &[u8], prefix: Option<&[u8]>, buffer: &[u8]) -> Result<Vec<u8>, IntegrityError> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| IntegrityError::Provider(e.to_string()))?;
        if let Some(prefix) = prefix {
            mac.update(prefix);
        }
        mac.update(buffer);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn hash_size(&self) -> usize {
        HASH_RESULT_LENGTH
    }
}

/// BLAKE3 in keyed mode. Requires a 32-byte key.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3KeyedProvider;

impl HashProvider for Blake3KeyedProvider {
    fn calc(&self, key: &[u8], prefix: Option<&[u8]>, buffer: &[u8]) -> Result<Vec<u8>, IntegrityError> {
        let key: &[u8; HASH_KEY_LENGTH] = key.try_into().map_err(|_| {
            IntegrityError::Provider(format!(
                "keyed BLAKE3 needs a {}-byte key, got {}",
                HASH_KEY_LENGTH,
                key.len()
            ))
        })?;
        let mut hasher = blake3::Hasher::new_keyed(key);
        if let Some(prefix) = prefix {
            hasher.update(prefix);
        }
        hasher.update(buffer);
        Ok(hasher.finalize().as_bytes().to_vec())
    }

    fn hash_size(&self) -> usize {
        blake3::OUT_LEN
    }
}

/// Provider selection for configuration files.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    HmacSha256,
    Blake3Keyed,
}

impl HashAlgorithm {
    pub fn provider(self) -> std::sync::Arc<dyn HashProvider> {
        match self {
            HashAlgorithm::HmacSha256 => std::sync::Arc::new(HmacSha256Provider),
            HashAlgorithm::Blake3Keyed => std::sync::Arc::new(Blake3KeyedProvider),
        }
    }
}
