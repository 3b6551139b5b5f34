use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::reference::{Reference, REFERENCE_SIZE};

use super::{content_address, StorageLoader, StorageSaver, StoreError};

#[derive(Debug, Default)]
struct MemoryStoreInner {
    blobs: Mutex<HashMap<Reference, Bytes>>,
    writes: AtomicUsize,
}

/// In-memory, content-addressed blob store.
///
/// Cheap to clone; clones share the same blobs.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
    reference_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store handing out 32 byte references
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner::default()),
            reference_size: REFERENCE_SIZE,
        }
    }

    /// A store handing out references of the given size (32 or 64)
    pub fn with_reference_size(reference_size: usize) -> Self {
        Self {
            reference_size,
            ..Self::new()
        }
    }

    /// Number of blobs held
    pub fn len(&self) -> usize {
        self.inner.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of save calls served, including ones for blobs already held
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.inner.blobs.lock().contains_key(reference)
    }
}

#[async_trait]
impl StorageLoader for MemoryStore {
    async fn load(&self, reference: &Reference) -> Result<Bytes, StoreError> {
        self.inner
            .blobs
            .lock()
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.clone()))
    }
}

#[async_trait]
impl StorageSaver for MemoryStore {
    async fn save(&self, data: Vec<u8>) -> Result<Reference, StoreError> {
        let reference = content_address(&data, self.reference_size)?;
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.inner
            .blobs
            .lock()
            .insert(reference.clone(), Bytes::from(data));
        Ok(reference)
    }
}
