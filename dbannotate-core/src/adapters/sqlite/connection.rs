//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db`, `sqlite://./relative.db` or a bare path
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! File databases are opened read-only. An in-memory database is private to
//! its single connection, so its pool is capped at one connection.

use super::{ConnectionConfig, SqliteProvider};
use crate::Result;
use crate::error::DbAnnotateError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

impl SqliteProvider {
    /// Opens a provider for a SQLite connection string.
    ///
    /// # Errors
    /// Returns error if the string is not a SQLite target or the database
    /// cannot be opened.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = parse_sqlite_connection_config(connection_string);
        Self::with_config(connection_string, config).await
    }

    /// Opens a provider with explicit pool settings.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the database cannot
    /// be opened.
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let pool = create_sqlite_pool(connection_string, &config).await?;
        Ok(Self { pool, config })
    }

    /// Wraps an already open pool.
    ///
    /// The caller keeps control of the pool's access mode. Used when the
    /// host has populated an in-memory database on the same connection.
    pub fn from_pool(pool: SqlitePool) -> Self {
        let config = ConnectionConfig {
            max_connections: 1,
            read_only: false,
            ..ConnectionConfig::default()
        };
        Self { pool, config }
    }

    /// Closes the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Returns true for in-memory connection strings.
pub fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Derives pool settings from a SQLite connection string.
pub fn parse_sqlite_connection_config(connection_string: &str) -> ConnectionConfig {
    let mut config = ConnectionConfig::new("localhost");
    config.database = Some(database_path(connection_string));

    if is_in_memory(connection_string) {
        config.max_connections = 1;
        config.read_only = false;
    }
    config
}

fn database_path(connection_string: &str) -> String {
    if is_in_memory(connection_string) {
        return ":memory:".to_string();
    }
    let path = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))
        .unwrap_or(connection_string);
    path.split('?').next().unwrap_or(path).to_string()
}

/// Rewrites bare paths and `:memory:` into sqlx's URL form.
pub fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }
    format!("sqlite://{}", connection_string)
}

async fn create_sqlite_pool(connection_string: &str, config: &ConnectionConfig) -> Result<SqlitePool> {
    let normalized = normalize_connection_string(connection_string);

    let options = SqliteConnectOptions::from_str(&normalized)
        .map_err(|e| {
            DbAnnotateError::configuration(format!("Invalid SQLite connection string: {}", e))
        })?
        .read_only(config.read_only)
        .busy_timeout(config.query_timeout);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(DbAnnotateError::connection_failed)
}
