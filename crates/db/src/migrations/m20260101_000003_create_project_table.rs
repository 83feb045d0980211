//! Create project table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Project::Institution).string_len(256).not_null())
                    .col(ColumnDef::new(Project::Name).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Project::Status)
                            .string_len(16)
                            .not_null()
                            .default("PLANNED"),
                    )
                    .col(ColumnDef::new(Project::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(Project::Description).text())
                    .col(ColumnDef::new(Project::ResponsibleName).string_len(256))
                    .col(ColumnDef::new(Project::ConfigName).string_len(256))
                    .col(ColumnDef::new(Project::StartDate).date())
                    .col(ColumnDef::new(Project::EndDate).date())
                    .col(ColumnDef::new(Project::VotesUp).integer().not_null().default(0))
                    .col(ColumnDef::new(Project::VotesDown).integer().not_null().default(0))
                    .col(ColumnDef::new(Project::UserVotes).json_binary().not_null())
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Project::UpdatedAt).timestamp_with_time_zone())
                    .check(Expr::col(Project::Progress).between(0, 100))
                    .to_owned(),
            )
            .await?;

        // Index: institution (scope predicate)
        manager
            .create_index(
                Index::create()
                    .name("idx_project_institution")
                    .table(Project::Table)
                    .col(Project::Institution)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_user_id")
                    .table(Project::Table)
                    .col(Project::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
    UserId,
    Institution,
    Name,
    Status,
    Progress,
    Description,
    ResponsibleName,
    ConfigName,
    StartDate,
    EndDate,
    VotesUp,
    VotesDown,
    UserVotes,
    CreatedAt,
    UpdatedAt,
}
