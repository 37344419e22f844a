//! Blob storage for covers, documents, and profile images.
//!
//! The book record only ever holds an opaque URL returned from here; a
//! storage failure surfaces as `UPSTREAM_UNAVAILABLE` and never touches
//! the record itself.

use std::path::PathBuf;

use tracing::debug;

/// Target folder for an uploaded blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobFolder {
    Covers,
    Documents,
    ProfileImages,
}

impl BlobFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobFolder::Covers => "covers",
            BlobFolder::Documents => "documents",
            BlobFolder::ProfileImages => "profile-images",
        }
    }
}

/// Blob storage failure.
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("blob write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores an uploaded file and returns a retrievable URL for it.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, folder: BlobFolder, bytes: &[u8]) -> Result<String, BlobStoreError>;
}

/// Blob store on the local filesystem, under `<root>/<folder>/<hex id>`.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, folder: BlobFolder, bytes: &[u8]) -> Result<String, BlobStoreError> {
        let dir = self.root.join(folder.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let name = hex::encode(rand::random::<[u8; 16]>());
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "stored blob");
        Ok(format!("file://{}", path.display()))
    }
}
