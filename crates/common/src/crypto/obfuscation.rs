//! Node body obfuscation
//!
//! Every serialised node starts with a 32 byte obfuscation key stored in the clear.
//! The rest of the node is XORed with that key, repeating it every 32 bytes.
//! The operation is its own inverse, so the same call scrambles and unscrambles.
//! An all-zero key disables obfuscation entirely.

use std::ops::Deref;

/// Size of an obfuscation key in bytes
pub const OBFUSCATION_KEY_SIZE: usize = 32;

/// Errors that can occur when building an obfuscation key
#[derive(Debug, thiserror::Error)]
pub enum ObfuscationKeyError {
    #[error("invalid obfuscation key size, expected {expected}, got {actual}")]
    InvalidSize { expected: usize, actual: usize },
    #[error("failed to generate random key: {0}")]
    Random(#[from] getrandom::Error),
}

/// A 256-bit XOR key scrambling a node's serialised body
///
/// # Examples
///
/// ```ignore
/// let key = ObfuscationKey::generate()?;
/// let mut data = b"some node body".to_vec();
///
/// key.apply(&mut data);
/// key.apply(&mut data);
/// assert_eq!(data, b"some node body");
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ObfuscationKey([u8; OBFUSCATION_KEY_SIZE]);

impl Deref for ObfuscationKey {
    type Target = [u8; OBFUSCATION_KEY_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; OBFUSCATION_KEY_SIZE]> for ObfuscationKey {
    fn from(bytes: [u8; OBFUSCATION_KEY_SIZE]) -> Self {
        ObfuscationKey(bytes)
    }
}

impl ObfuscationKey {
    /// Generate a new random key using the system RNG
    pub fn generate() -> Result<Self, ObfuscationKeyError> {
        let mut buff = [0; OBFUSCATION_KEY_SIZE];
        getrandom::getrandom(&mut buff)?;
        Ok(Self(buff))
    }

    /// Create a key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `OBFUSCATION_KEY_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, ObfuscationKeyError> {
        let bytes: [u8; OBFUSCATION_KEY_SIZE] =
            data.try_into().map_err(|_| ObfuscationKeyError::InvalidSize {
                expected: OBFUSCATION_KEY_SIZE,
                actual: data.len(),
            })?;
        Ok(bytes.into())
    }

    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Whether this is the all-zero key, which leaves data untouched
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// XOR `data` in place with this key.
    ///
    /// The key restarts at the beginning of `data`, so obfuscating a sub-range
    ///  of a buffer is done by passing the corresponding sub-slice.
    pub fn apply(&self, data: &mut [u8]) {
        obfuscate(self, data)
    }
}

/// XOR `data` in place, chunk by chunk, with `key`.
///
/// Chunks are `key.len()` bytes long (the last one may be shorter) and byte `j`
///  of every chunk is XORed with `key[j]`. A zero key is a no-op.
pub fn obfuscate(key: &ObfuscationKey, data: &mut [u8]) {
    if key.is_zero() {
        return;
    }
    for chunk in data.chunks_mut(OBFUSCATION_KEY_SIZE) {
        for (byte, k) in chunk.iter_mut().zip(key.iter()) {
            *byte ^= k;
        }
    }
}
