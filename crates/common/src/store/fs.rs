use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::reference::{Reference, REFERENCE_SIZE};

use super::{content_address, StorageLoader, StorageSaver, StoreError};

/// Blob store backed by a local directory, one file per blob named by the
///  hex of its reference.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    reference_size: usize,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `root`
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_reference_size(root, REFERENCE_SIZE).await
    }

    pub async fn with_reference_size(
        root: impl AsRef<Path>,
        reference_size: usize,
    ) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            reference_size,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reference_size(&self) -> usize {
        self.reference_size
    }

    fn blob_path(&self, reference: &Reference) -> PathBuf {
        self.root.join(reference.to_hex())
    }
}

#[async_trait]
impl StorageLoader for FsStore {
    async fn load(&self, reference: &Reference) -> Result<Bytes, StoreError> {
        match tokio::fs::read(self.blob_path(reference)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(reference.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StorageSaver for FsStore {
    async fn save(&self, data: Vec<u8>) -> Result<Reference, StoreError> {
        let reference = content_address(&data, self.reference_size)?;
        let path = self.blob_path(&reference);
        // content addressed: an existing file already holds these bytes
        if !tokio::fs::try_exists(&path).await? {
            tokio::fs::write(&path, &data).await?;
        }
        tracing::trace!(%reference, size = data.len(), "stored blob");
        Ok(reference)
    }
}
