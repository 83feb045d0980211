//! Database migrations.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_institution_table;
mod m20260101_000002_create_user_table;
mod m20260101_000003_create_project_table;
mod m20260101_000004_create_user_group_table;
mod m20260101_000005_create_vote_record_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_institution_table::Migration),
            Box::new(m20260101_000002_create_user_table::Migration),
            Box::new(m20260101_000003_create_project_table::Migration),
            Box::new(m20260101_000004_create_user_group_table::Migration),
            Box::new(m20260101_000005_create_vote_record_table::Migration),
        ]
    }
}
