//! Helpers for integration tests that need a real `PostgreSQL` server.
//!
//! Connection settings come from `TEST_DB_HOST`, `TEST_DB_PORT`, `TEST_DB_USER`
//! and `TEST_DB_PASSWORD`. Each [`TestDatabase`] gets its own freshly migrated
//! database so tests can run in parallel.

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use tracing::info;

const TABLES: [&str; 5] = ["vote_record", "user_group", "project", "user", "institution"];

/// Test database server settings.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER")
                .unwrap_or_else(|_| "govboard_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "govboard_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// URL of database `name` on the test server.
    #[must_use]
    pub fn url_for(&self, name: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{name}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A throwaway, migrated database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    name: String,
    config: TestDbConfig,
}

impl TestDatabase {
    /// Create a uniquely named database and run all migrations on it.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("govboard_test_{}", &suffix[..8]);

        let admin = Database::connect(&config.url_for("postgres")).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{name}\""),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.url_for(&name)).await?;
        {
            use sea_orm_migration::MigratorTrait;
            crate::migrations::Migrator::up(&conn, None).await?;
        }

        info!(database = %name, "Created test database");
        Ok(Self { conn, name, config })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Remove every row from every table.
    pub async fn truncate_all(&self) -> Result<(), DbErr> {
        let tables = TABLES
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("TRUNCATE TABLE {tables}"),
            ))
            .await?;
        Ok(())
    }

    /// Drop the database. Consumes self because the connection must close first.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let admin = Database::connect(&self.config.url_for("postgres")).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.name, "Dropped test database");
        Ok(())
    }
}
