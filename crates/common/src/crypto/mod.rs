//! Cryptographic primitives for Mantaray manifests
//!
//! Mantaray needs very little cryptography:
//!
//! - **Obfuscation**: a 32 byte XOR key scrambles each serialised node body.
//!   It is not encryption; anyone holding the node bytes also holds the key.
//! - **Hashing**: Keccak-256 derives the format version tag embedded in every
//!   node, and addresses blobs in the bundled stores.

mod hash;
mod obfuscation;

pub use hash::{keccak256, KECCAK256_SIZE};
pub use obfuscation::{obfuscate, ObfuscationKey, ObfuscationKeyError, OBFUSCATION_KEY_SIZE};
