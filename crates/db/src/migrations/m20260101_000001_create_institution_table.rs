//! Create institution table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Institution::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Institution::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Institution::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Institution::Status)
                            .string_len(16)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(Institution::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Institution::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Projects and users reference institutions by name
        manager
            .create_index(
                Index::create()
                    .name("idx_institution_name")
                    .table(Institution::Table)
                    .col(Institution::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Institution::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Institution {
    Table,
    Id,
    Name,
    Status,
    CreatedAt,
    UpdatedAt,
}
