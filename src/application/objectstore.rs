//! Object store seam for product and promo images.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("remote delete failed: {0}")]
    Delete(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A stored remote asset: the public URL plus the storage key needed to
/// delete it later. Keys are persisted alongside the URL instead of being
/// re-derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub url: String,
    pub key: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, local_path: &Path, folder: &str)
    -> Result<StoredAsset, ObjectStoreError>;

    /// Remove a remote asset. Delete-path callers treat failures as
    /// best-effort.
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}

/// A locally buffered upload awaiting transfer to the object store.
///
/// The local file is removed when the value drops, so every exit from a
/// write path cleans the temp file up. The remote asset, once uploaded, is
/// not rolled back.
#[derive(Debug)]
pub struct PendingUpload {
    path: PathBuf,
}

impl PendingUpload {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "failed to remove buffered upload");
            }
        }
    }
}
