//! PostgreSQL backing store.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter,
};
use uuid::Uuid;

use gateway_core::domain::{BoostRecord, Post, UploadedFileRecord};
use gateway_core::ports::{BackingStore, StoreError};

use super::entity::{boost, post, uploaded_file};

/// Writes through the service role connection. Row-level access policies
/// on these tables do not apply to it.
pub struct PostgresBackingStore {
    db: DbConn,
}

impl PostgresBackingStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn insert<A>(&self, model: A) -> Result<<A::Entity as EntityTrait>::Model, StoreError>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        model.insert(&self.db).await.map_err(map_db_err)
    }
}

fn map_db_err(e: DbErr) -> StoreError {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Connection(e.to_string()),
        other => {
            let err_str = other.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                StoreError::Constraint(err_str)
            } else {
                StoreError::Query(err_str)
            }
        }
    }
}

#[async_trait]
impl BackingStore for PostgresBackingStore {
    async fn count_uploaded_files(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        uploaded_file::Entity::find()
            .filter(uploaded_file::Column::OwnerId.eq(owner_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn insert_uploaded_file(
        &self,
        record: UploadedFileRecord,
    ) -> Result<UploadedFileRecord, StoreError> {
        tracing::debug!(record_id = %record.id, owner_id = %record.owner_id, "Inserting uploaded file");
        let model = self.insert(uploaded_file::ActiveModel::from(record)).await?;
        Ok(model.into())
    }

    async fn insert_boost(&self, record: BoostRecord) -> Result<BoostRecord, StoreError> {
        tracing::debug!(boost_id = %record.id, session_id = %record.external_session_id, "Inserting boost");
        let model = self.insert(boost::ActiveModel::from(record)).await?;
        model.try_into()
    }

    async fn find_boost_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BoostRecord>, StoreError> {
        boost::Entity::find()
            .filter(boost::Column::ExternalSessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(BoostRecord::try_from)
            .transpose()
    }

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        tracing::debug!(post_id = %post.id, "Inserting post");
        let model = self.insert(post::ActiveModel::from(post)).await?;
        Ok(model.into())
    }
}
