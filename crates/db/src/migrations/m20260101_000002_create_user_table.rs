//! Create user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(User::Name).string_len(256).not_null())
                    .col(ColumnDef::new(User::Email).string_len(320).not_null())
                    .col(ColumnDef::new(User::PasswordHash).string_len(256).not_null())
                    .col(
                        ColumnDef::new(User::Role)
                            .string_len(16)
                            .not_null()
                            .default("MEMBER"),
                    )
                    .col(ColumnDef::new(User::AvatarUrl).string_len(1024))
                    .col(ColumnDef::new(User::JobTitle).string_len(256))
                    .col(ColumnDef::new(User::Institution).string_len(256).not_null())
                    .col(
                        ColumnDef::new(User::AccessibleInstitutions)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(User::Token).string_len(64))
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(User::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique index: email (stored lowercased)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_email")
                    .table(User::Table)
                    .col(User::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: token
        manager
            .create_index(
                Index::create()
                    .name("idx_user_token")
                    .table(User::Table)
                    .col(User::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: institution (for scoped user listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_institution")
                    .table(User::Table)
                    .col(User::Institution)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    AvatarUrl,
    JobTitle,
    Institution,
    AccessibleInstitutions,
    Token,
    CreatedAt,
    UpdatedAt,
}
