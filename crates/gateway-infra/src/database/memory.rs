//! In-memory backing store - used as fallback when no database is configured.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use gateway_core::domain::{BoostRecord, Post, UploadedFileRecord};
use gateway_core::ports::{BackingStore, StoreError};

/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryBackingStore {
    files: RwLock<Vec<UploadedFileRecord>>,
    boosts: RwLock<Vec<BoostRecord>>,
    posts: RwLock<Vec<Post>>,
}

impl InMemoryBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn boosts(&self) -> Vec<BoostRecord> {
        self.boosts.read().await.clone()
    }

    pub async fn posts(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }
}

#[async_trait]
impl BackingStore for InMemoryBackingStore {
    async fn count_uploaded_files(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let files = self.files.read().await;
        Ok(files.iter().filter(|f| f.owner_id == owner_id).count() as u64)
    }

    async fn insert_uploaded_file(
        &self,
        record: UploadedFileRecord,
    ) -> Result<UploadedFileRecord, StoreError> {
        let mut files = self.files.write().await;
        if files.iter().any(|f| f.id == record.id) {
            return Err(StoreError::Constraint("uploaded file already exists".to_string()));
        }
        files.push(record.clone());
        Ok(record)
    }

    async fn insert_boost(&self, record: BoostRecord) -> Result<BoostRecord, StoreError> {
        let mut boosts = self.boosts.write().await;
        if boosts
            .iter()
            .any(|b| b.external_session_id == record.external_session_id)
        {
            return Err(StoreError::Constraint(format!(
                "session {} already recorded",
                record.external_session_id
            )));
        }
        boosts.push(record.clone());
        Ok(record)
    }

    async fn find_boost_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BoostRecord>, StoreError> {
        let boosts = self.boosts.read().await;
        Ok(boosts
            .iter()
            .find(|b| b.external_session_id == session_id)
            .cloned())
    }

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.posts.write().await.push(post.clone());
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use gateway_core::domain::{BoostTier, FileDescriptor};

    use super::*;

    fn descriptor(name: &str) -> FileDescriptor {
        FileDescriptor {
            url: format!("https://cdn.test/{}", name),
            name: name.to_string(),
            key: name.to_string(),
            size: 10,
            mime_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_count_is_per_owner() {
        let store = InMemoryBackingStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for name in ["a.png", "b.png"] {
            store
                .insert_uploaded_file(UploadedFileRecord::new(alice, &descriptor(name)))
                .await
                .unwrap();
        }
        store
            .insert_uploaded_file(UploadedFileRecord::new(bob, &descriptor("c.png")))
            .await
            .unwrap();

        assert_eq!(store.count_uploaded_files(alice).await.unwrap(), 2);
        assert_eq!(store.count_uploaded_files(bob).await.unwrap(), 1);
        assert_eq!(store.count_uploaded_files(Uuid::new_v4()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_session_is_constraint_error() {
        let store = InMemoryBackingStore::new();
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();

        store
            .insert_boost(BoostRecord::pending(user, post, BoostTier::Featured, 1, "cs_1".into()))
            .await
            .unwrap();
        let err = store
            .insert_boost(BoostRecord::pending(user, post, BoostTier::Featured, 1, "cs_1".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Constraint(_)));
        assert_eq!(store.boosts().await.len(), 1);

        let found = store.find_boost_by_session("cs_1").await.unwrap().unwrap();
        assert_eq!(found.user_id, user);
        assert!(store.find_boost_by_session("cs_2").await.unwrap().is_none());
    }
}
