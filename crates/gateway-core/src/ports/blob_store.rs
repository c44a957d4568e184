//! External blob storage port.

use async_trait::async_trait;
use uuid::Uuid;

/// Metadata sent alongside the bytes of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub owner_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Location of an object after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub external_key: String,
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` and return where they ended up.
    async fn put(&self, bytes: Vec<u8>, metadata: &BlobMetadata) -> Result<StoredBlob, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Blob store rejected the object: {0}")]
    Rejected(String),

    #[error("Unexpected response: {0}")]
    Protocol(String),
}
