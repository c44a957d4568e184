//! Backing store port.
//!
//! Every write here runs with service-level privileges and bypasses the
//! per-caller access policy of the underlying tables.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{BoostRecord, Post, UploadedFileRecord};

#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Number of files already recorded for an owner.
    async fn count_uploaded_files(&self, owner_id: Uuid) -> Result<u64, StoreError>;

    async fn insert_uploaded_file(
        &self,
        record: UploadedFileRecord,
    ) -> Result<UploadedFileRecord, StoreError>;

    async fn insert_boost(&self, record: BoostRecord) -> Result<BoostRecord, StoreError>;

    /// The boost bound to a processor session, if one was recorded.
    async fn find_boost_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BoostRecord>, StoreError>;

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError>;
}

/// Backing store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
