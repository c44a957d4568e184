use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UploadedFiles::Table)
                    .if_not_exists()
                    .col(pk_uuid(UploadedFiles::Id))
                    .col(uuid(UploadedFiles::OwnerId))
                    .col(string(UploadedFiles::FileName))
                    .col(text(UploadedFiles::FileUrl))
                    .col(big_integer(UploadedFiles::FileSize))
                    .col(string(UploadedFiles::FileType))
                    .col(string(UploadedFiles::ExternalKey))
                    .col(timestamp_with_time_zone(UploadedFiles::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Every upload counts the owner's existing files.
        manager
            .create_index(
                Index::create()
                    .name("idx_uploaded_files_owner_id")
                    .table(UploadedFiles::Table)
                    .col(UploadedFiles::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Boosts::Table)
                    .if_not_exists()
                    .col(pk_uuid(Boosts::Id))
                    .col(uuid(Boosts::UserId))
                    .col(uuid(Boosts::TargetPostId))
                    .col(string(Boosts::BoostType))
                    .col(integer(Boosts::DurationDays))
                    .col(big_integer(Boosts::Amount))
                    .col(string_uniq(Boosts::ExternalSessionId))
                    .col(string(Boosts::Status))
                    .col(timestamp_with_time_zone(Boosts::ExpiresAt))
                    .col(timestamp_with_time_zone(Boosts::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(pk_uuid(Posts::Id))
                    .col(uuid(Posts::AuthorId))
                    .col(text(Posts::Content))
                    .col(timestamp_with_time_zone(Posts::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Boosts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UploadedFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UploadedFiles {
    Table,
    Id,
    OwnerId,
    FileName,
    FileUrl,
    FileSize,
    FileType,
    ExternalKey,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Boosts {
    Table,
    Id,
    UserId,
    TargetPostId,
    BoostType,
    DurationDays,
    Amount,
    ExternalSessionId,
    Status,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    AuthorId,
    Content,
    CreatedAt,
}
