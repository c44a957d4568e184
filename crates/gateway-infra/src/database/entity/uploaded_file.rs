//! Uploaded file metadata entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use gateway_core::domain::UploadedFileRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "uploaded_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub file_name: String,
    #[sea_orm(column_type = "Text")]
    pub file_url: String,
    pub file_size: i64,
    pub file_type: String,
    pub external_key: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UploadedFileRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            file_name: model.file_name,
            file_url: model.file_url,
            file_size: model.file_size.max(0) as u64,
            file_type: model.file_type,
            external_key: model.external_key,
            created_at: model.created_at.into(),
        }
    }
}

impl From<UploadedFileRecord> for ActiveModel {
    fn from(record: UploadedFileRecord) -> Self {
        Self {
            id: Set(record.id),
            owner_id: Set(record.owner_id),
            file_name: Set(record.file_name),
            file_url: Set(record.file_url),
            // Sizes are capped at MAX_FILE_SIZE before they get here.
            file_size: Set(record.file_size as i64),
            file_type: Set(record.file_type),
            external_key: Set(record.external_key),
            created_at: Set(record.created_at.into()),
        }
    }
}
