//! PostgreSQL connection pool management.

use super::{ConnectionConfig, DEFAULT_SCHEMA, PostgresProvider};
use crate::Result;
use crate::error::{DbAnnotateError, redact_database_url};
use sqlx::PgPool;
use std::time::Duration;

impl PostgresProvider {
    /// Connects to PostgreSQL and inspects the `public` schema.
    ///
    /// # Errors
    /// Returns error if the connection string is malformed or the server
    /// cannot be reached.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = parse_connection_config(connection_string)?;
        Self::with_config(connection_string, config).await
    }

    /// Connects with explicit pool settings.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the pool cannot
    /// open its first connection.
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let pool = create_connection_pool(connection_string, &config).await?;
        tracing::debug!("Connected to PostgreSQL at {}", config);

        Ok(Self {
            pool,
            config,
            schema: DEFAULT_SCHEMA.to_string(),
        })
    }

    /// Builder method to inspect another schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Closes the connection pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Parses a PostgreSQL URL into pool settings.
///
/// Recognized query parameters: `connect_timeout` (seconds),
/// `statement_timeout` (milliseconds) and `pool_max_conns`, each capped at
/// safe limits. Anything else is left for the driver.
///
/// # Errors
/// Returns error if the string is not a `postgres://` or `postgresql://` URL.
pub fn parse_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
    let url = url::Url::parse(connection_string).map_err(|e| {
        DbAnnotateError::configuration(format!("Invalid PostgreSQL connection string format: {}", e))
    })?;

    if !matches!(url.scheme(), "postgres" | "postgresql") {
        return Err(DbAnnotateError::configuration(
            "Connection string must use postgres:// or postgresql:// scheme",
        ));
    }

    let mut config = ConnectionConfig::from_url(connection_string)?;
    if config.port.is_none() {
        config.port = Some(5432);
    }

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "connect_timeout" => {
                if let Ok(secs) = value.parse::<u64>()
                    && (1..=300).contains(&secs)
                {
                    config.connect_timeout = Duration::from_secs(secs);
                }
            }
            "statement_timeout" => {
                if let Ok(millis) = value.parse::<u64>()
                    && (1..=300_000).contains(&millis)
                {
                    config.query_timeout = Duration::from_millis(millis);
                }
            }
            "pool_max_conns" => {
                if let Ok(max) = value.parse::<u32>()
                    && (1..=100).contains(&max)
                {
                    config.max_connections = max;
                }
            }
            _ => {}
        }
    }

    config.validate()?;
    Ok(config)
}

async fn create_connection_pool(connection_string: &str, config: &ConnectionConfig) -> Result<PgPool> {
    use sqlx::Executor;

    let statement_timeout_ms = config.query_timeout.as_millis();
    let read_only = config.read_only;

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(format!("SET statement_timeout = {}", statement_timeout_ms).as_str())
                    .await?;
                conn.execute("SET lock_timeout = '10s'").await?;
                let app_name = format!("dbannotate-{}", env!("CARGO_PKG_VERSION"));
                conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                    .await?;
                if read_only {
                    conn.execute("SET default_transaction_read_only = on").await?;
                }
                Ok(())
            })
        })
        .connect(connection_string)
        .await
        .map_err(|e| {
            tracing::debug!(
                "Failed to connect to {}",
                redact_database_url(connection_string)
            );
            DbAnnotateError::connection_failed(e)
        })
}
