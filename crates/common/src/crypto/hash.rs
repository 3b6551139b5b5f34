use sha3::{Digest, Keccak256};

/// Size of a Keccak-256 digest in bytes
pub const KECCAK256_SIZE: usize = 32;

/// Hash a value using Keccak-256.
pub fn keccak256(data: &[u8]) -> [u8; KECCAK256_SIZE] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
