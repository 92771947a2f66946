//! Cryptographic primitives for token signing
//!
//! HMAC-SHA256 with a pre-keyed MAC, plus constant-time comparison helpers
//! for secrets that are compared outside of MAC verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Pre-keyed HMAC-SHA256 instance, cloned per signature
#[derive(Clone)]
pub struct HmacKey {
    mac: Hmac<Sha256>,
    key_length: usize,
}

impl HmacKey {
    /// Signature length in bytes
    pub const SIGNATURE_LENGTH: usize = 32;

    /// Keys shorter than this are accepted but weaker than the hash output
    pub const RECOMMENDED_KEY_LENGTH: usize = 32;

    /// Create a new HMAC key from bytes.
    ///
    /// # Errors
    /// Returns error if key is empty.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, HmacKeyError> {
        let key_bytes = key.as_ref();
        if key_bytes.is_empty() {
            return Err(HmacKeyError::Empty);
        }
        let mac = Hmac::<Sha256>::new_from_slice(key_bytes)
            .map_err(|_| HmacKeyError::InvalidLength(key_bytes.len()))?;
        Ok(Self {
            mac,
            key_length: key_bytes.len(),
        })
    }

    /// Length of the raw key material
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Sign data and return the MAC bytes
    pub fn sign(&self, data: &[u8]) -> [u8; HmacKey::SIGNATURE_LENGTH] {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().into()
    }

    /// Verify a signature in constant time
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.verify_slice(signature).is_ok()
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacKey")
            .field("key_length", &self.key_length)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when creating an HMAC key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HmacKeyError {
    #[error("sign key cannot be empty")]
    Empty,

    #[error("HMAC rejected a key of {0} bytes")]
    InvalidLength(usize),
}

/// Constant-time byte slice comparison.
///
/// Length is not treated as secret: slices of different length compare
/// unequal immediately.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time string comparison.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
