//! Storage collaborators
//!
//! The trie never talks to storage directly. Saving hands each serialised
//!  node to a [`StorageSaver`], which answers with the reference it stored
//!  the bytes under; loading asks a [`StorageLoader`] for the bytes behind a
//!  reference. Whatever sits behind these traits (a network client, a local
//!  directory, a map in memory) decides how references are derived.
//!
//! Two stores ship with the crate, both addressing blobs by Keccak-256:
//!
//! - [`MemoryStore`]: an in-memory map, mostly for tests
//! - [`FsStore`]: one file per blob in a local directory

mod fs;
mod memory;

use async_trait::async_trait;
use bytes::Bytes;

use crate::crypto::keccak256;
use crate::reference::{Reference, ReferenceError, ENCRYPTED_REFERENCE_SIZE, REFERENCE_SIZE};

pub use fs::FsStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("blob not found: {0}")]
    NotFound(Reference),
    #[error("invalid reference: {0}")]
    InvalidReference(#[from] ReferenceError),
}

/// Fetches the bytes previously stored under a reference
#[async_trait]
pub trait StorageLoader: Send + Sync {
    async fn load(&self, reference: &Reference) -> Result<Bytes, StoreError>;
}

/// Stores bytes and returns the reference they can be loaded back with
#[async_trait]
pub trait StorageSaver: Send + Sync {
    async fn save(&self, data: Vec<u8>) -> Result<Reference, StoreError>;
}

/// Content address of `data` at the given reference size.
///
/// 32 byte references are `keccak256(data)`; 64 byte references append
///  `keccak256(keccak256(data))` so both halves are derived from the data.
pub fn content_address(data: &[u8], reference_size: usize) -> Result<Reference, StoreError> {
    let hash = keccak256(data);
    match reference_size {
        REFERENCE_SIZE => Ok(Reference::from(hash)),
        ENCRYPTED_REFERENCE_SIZE => {
            let mut bytes = [0u8; ENCRYPTED_REFERENCE_SIZE];
            bytes[..REFERENCE_SIZE].copy_from_slice(&hash);
            bytes[REFERENCE_SIZE..].copy_from_slice(&keccak256(&hash));
            Ok(Reference::from(bytes))
        }
        size => Err(ReferenceError::InvalidLength(size).into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_content_address_sizes() {
        let short = content_address(b"hello", 32).unwrap();
        let long = content_address(b"hello", 64).unwrap();
        assert_eq!(short.len(), 32);
        assert_eq!(long.len(), 64);
        assert_eq!(&long[..32], &short[..]);
        assert!(content_address(b"hello", 16).is_err());
    }

    #[test]
    fn test_content_address_is_deterministic() {
        assert_eq!(
            content_address(b"a", 32).unwrap(),
            content_address(b"a", 32).unwrap()
        );
        assert_ne!(
            content_address(b"a", 32).unwrap(),
            content_address(b"b", 32).unwrap()
        );
    }
}
