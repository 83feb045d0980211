//! Create vote record table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VoteRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VoteRecord::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VoteRecord::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(VoteRecord::UserName).string_len(256).not_null())
                    .col(ColumnDef::new(VoteRecord::UserAvatar).string_len(1024))
                    .col(ColumnDef::new(VoteRecord::ItemId).string_len(32).not_null())
                    .col(ColumnDef::new(VoteRecord::ItemName).string_len(512).not_null())
                    .col(
                        ColumnDef::new(VoteRecord::ItemType)
                            .string_len(16)
                            .not_null()
                            .default("project"),
                    )
                    .col(ColumnDef::new(VoteRecord::VoteType).string_len(8).not_null())
                    .col(ColumnDef::new(VoteRecord::Institution).string_len(256).not_null())
                    .col(
                        ColumnDef::new(VoteRecord::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for a member's own history
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_record_user_id_created_at")
                    .table(VoteRecord::Table)
                    .col(VoteRecord::UserId)
                    .col(VoteRecord::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (item_id, created_at) for aggregate repair
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_record_item_id_created_at")
                    .table(VoteRecord::Table)
                    .col(VoteRecord::ItemId)
                    .col(VoteRecord::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vote_record_created_at")
                    .table(VoteRecord::Table)
                    .col(VoteRecord::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VoteRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VoteRecord {
    Table,
    Id,
    UserId,
    UserName,
    UserAvatar,
    ItemId,
    ItemName,
    ItemType,
    VoteType,
    Institution,
    CreatedAt,
}
