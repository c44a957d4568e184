#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, Value};
    use uuid::Uuid;

    use crate::database::entity::{boost, post};
    use crate::database::postgres_store::PostgresBackingStore;
    use gateway_core::domain::{BoostRecord, BoostStatus, BoostTier, Post};
    use gateway_core::ports::{BackingStore, StoreError};

    #[tokio::test]
    async fn test_count_uploaded_files() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[BTreeMap::from([("num_items", Value::from(3i64))])]])
            .into_connection();

        let store = PostgresBackingStore::new(db);

        assert_eq!(store.count_uploaded_files(Uuid::new_v4()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_insert_post_returns_stored_row() {
        let post = Post::new(Uuid::new_v4(), "<p>hi</p>".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post::Model {
                id: post.id,
                author_id: post.author_id,
                content: post.content.clone(),
                created_at: post.created_at.into(),
            }]])
            .into_connection();

        let store = PostgresBackingStore::new(db);
        let stored = store.insert_post(post.clone()).await.unwrap();

        assert_eq!(stored.id, post.id);
        assert_eq!(stored.content, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_insert_boost_round_trips_enums() {
        let record = BoostRecord::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            BoostTier::Premium,
            5,
            "cs_live_1".to_string(),
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[boost::Model {
                id: record.id,
                user_id: record.user_id,
                target_post_id: record.target_post_id,
                boost_type: "premium".to_string(),
                duration_days: 5,
                amount: 10_000,
                external_session_id: "cs_live_1".to_string(),
                status: "pending".to_string(),
                expires_at: record.expires_at.into(),
                created_at: record.created_at.into(),
            }]])
            .into_connection();

        let store = PostgresBackingStore::new(db);
        let stored = store.insert_boost(record).await.unwrap();

        assert_eq!(stored.boost_type, BoostTier::Premium);
        assert_eq!(stored.status, BoostStatus::Pending);
        assert_eq!(stored.amount, 10_000);
    }

    #[tokio::test]
    async fn test_find_boost_by_unknown_session_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<boost::Model>::new()])
            .into_connection();

        let store = PostgresBackingStore::new(db);

        assert!(store.find_boost_by_session("cs_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_failure_maps_to_store_error() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom(
                "duplicate key value violates unique constraint".to_string(),
            )])
            .into_connection();

        let store = PostgresBackingStore::new(db);
        let record = gateway_core::domain::UploadedFileRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            file_name: "a.png".to_string(),
            file_url: "https://cdn.test/a.png".to_string(),
            file_size: 10,
            file_type: "image/png".to_string(),
            external_key: "a.png".to_string(),
            created_at: now,
        };

        let err = store.insert_uploaded_file(record).await.unwrap_err();

        assert!(matches!(err, StoreError::Constraint(_)));
    }
}
