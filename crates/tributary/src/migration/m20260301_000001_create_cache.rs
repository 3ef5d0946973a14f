//! Initial migration creating the document cache and sync history.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_documents(manager).await?;
        self.create_sync_infos(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncInfos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_documents(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Documents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Documents::EntityType).string().not_null())
                    .col(ColumnDef::new(Documents::NaturalKey).string().not_null())
                    .col(ColumnDef::new(Documents::ParentKey).string().null())
                    .col(
                        ColumnDef::new(Documents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Documents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Documents::Payload).json().not_null())
                    .col(
                        ColumnDef::new(Documents::CachedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups by natural key during upsert
        manager
            .create_index(
                Index::create()
                    .name("idx_documents_type_key")
                    .table(Documents::Table)
                    .col(Documents::EntityType)
                    .col(Documents::NaturalKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_type_parent")
                    .table(Documents::Table)
                    .col(Documents::EntityType)
                    .col(Documents::ParentKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_updated_at")
                    .table(Documents::Table)
                    .col((Documents::UpdatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_sync_infos(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncInfos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncInfos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncInfos::EntityType).string().not_null())
                    .col(
                        ColumnDef::new(SyncInfos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncInfos::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_infos_type_created")
                    .table(SyncInfos::Table)
                    .col(SyncInfos::EntityType)
                    .col((SyncInfos::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "documents")]
enum Documents {
    Table,
    Id,
    EntityType,
    NaturalKey,
    ParentKey,
    CreatedAt,
    UpdatedAt,
    Payload,
    CachedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_infos")]
enum SyncInfos {
    Table,
    Id,
    EntityType,
    CreatedAt,
    UpdatedAt,
}
