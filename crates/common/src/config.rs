//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Governance rules.
    #[serde(default)]
    pub governance: GovernanceConfig,
    /// First-run admin account, created only when the store has no users.
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a single request, store round trips included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait when opening a new connection.
    #[serde(default = "default_store_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_store_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Governance rules shared by the scope resolver and the vote ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    /// Name of the distinguished institution that sorts first and is admin-only in pickers.
    #[serde(default = "default_headquarters_name")]
    pub headquarters_name: String,
    /// Maximum number of vote records returned by a history listing.
    #[serde(default = "default_vote_history_limit")]
    pub vote_history_limit: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            headquarters_name: default_headquarters_name(),
            vote_history_limit: default_vote_history_limit(),
        }
    }
}

/// Bootstrap admin account.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Admin email (login).
    pub admin_email: String,
    /// Admin password, hashed before it is stored.
    pub admin_password: String,
    /// Admin display name.
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    /// Home institution of the admin; defaults to the headquarters name.
    #[serde(default)]
    pub institution: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3001
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_store_timeout_secs() -> u64 {
    10
}

fn default_headquarters_name() -> String {
    "Headquarters".to_string()
}

const fn default_vote_history_limit() -> u64 {
    100
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `GOVBOARD_ENV`)
    /// 4. Environment variables with `GOVBOARD__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("GOVBOARD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GOVBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("GOVBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
