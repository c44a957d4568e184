//! In-memory blob store for local development.

use async_trait::async_trait;
use dashmap::DashMap;

use gateway_core::ports::{BlobMetadata, BlobStore, BlobStoreError, StoredBlob};

use super::object_key;

/// Keeps objects in process memory. Data is lost on restart.
pub struct InMemoryBlobStore {
    objects: DashMap<String, Vec<u8>>,
    public_base_url: String,
}

impl InMemoryBlobStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new("http://localhost:8080/blobs")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>, metadata: &BlobMetadata) -> Result<StoredBlob, BlobStoreError> {
        let key = object_key(metadata.owner_id, &metadata.file_name);
        self.objects.insert(key.clone(), bytes);
        Ok(StoredBlob {
            url: format!("{}/{}", self.public_base_url.trim_end_matches('/'), key),
            external_key: key,
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryBlobStore::new("https://cdn.test/");
        let metadata = BlobMetadata {
            owner_id: Uuid::new_v4(),
            file_name: "a.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 2,
        };

        let stored = store.put(vec![7, 8], &metadata).await.unwrap();

        assert_eq!(store.get(&stored.external_key), Some(vec![7, 8]));
        assert_eq!(stored.url, format!("https://cdn.test/{}", stored.external_key));
        assert_eq!(store.len(), 1);
    }
}
