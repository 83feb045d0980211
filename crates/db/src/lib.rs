//! Database layer for govboard.
//!
//! Five record kinds live here: institutions, users, projects (with their
//! embedded vote aggregate), user groups, and the append-only vote ledger.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use govboard_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt).await.map_err(map_db_err)
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None).await.map_err(map_db_err)
}

/// Convert a store error into an application error.
///
/// Pool exhaustion, acquire timeouts and dropped connections are transient;
/// everything else is reported as a plain database error.
#[must_use]
pub fn map_db_err(err: DbErr) -> AppError {
    match err {
        DbErr::ConnectionAcquire(e) => AppError::TransientStore(e.to_string()),
        DbErr::Conn(e) => AppError::TransientStore(e.to_string()),
        other => AppError::Database(other.to_string()),
    }
}
