//! Boost purchase entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use gateway_core::domain::{BoostRecord, BoostStatus, BoostTier};
use gateway_core::ports::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "boosts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_post_id: Uuid,
    pub boost_type: String,
    pub duration_days: i32,
    pub amount: i64,
    #[sea_orm(unique)]
    pub external_session_id: String,
    pub status: String,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Rows written by other services may carry values this build does not know.
impl TryFrom<Model> for BoostRecord {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let boost_type: BoostTier = model
            .boost_type
            .parse()
            .map_err(|e: gateway_core::GatewayError| StoreError::Query(e.to_string()))?;
        let status: BoostStatus = model.status.parse().map_err(StoreError::Query)?;

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            target_post_id: model.target_post_id,
            boost_type,
            duration_days: u32::try_from(model.duration_days)
                .map_err(|e| StoreError::Query(e.to_string()))?,
            amount: model.amount,
            external_session_id: model.external_session_id,
            status,
            expires_at: model.expires_at.into(),
            created_at: model.created_at.into(),
        })
    }
}

impl From<BoostRecord> for ActiveModel {
    fn from(record: BoostRecord) -> Self {
        Self {
            id: Set(record.id),
            user_id: Set(record.user_id),
            target_post_id: Set(record.target_post_id),
            boost_type: Set(record.boost_type.as_str().to_string()),
            duration_days: Set(record.duration_days as i32),
            amount: Set(record.amount),
            external_session_id: Set(record.external_session_id),
            status: Set(record.status.as_str().to_string()),
            expires_at: Set(record.expires_at.into()),
            created_at: Set(record.created_at.into()),
        }
    }
}
