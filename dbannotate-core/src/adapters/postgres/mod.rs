//! PostgreSQL metadata provider with connection pooling.
//!
//! # Module Structure
//! - `connection`: connection string parsing, pool creation, session settings
//! - `type_mapping`: `information_schema` types to unified types
//! - `introspection`: tables, columns, keys, indexes, sizes, inheritance
//! - `sampling`: grouped value sampling
//!
//! # Read-only Guarantees
//! - Every pooled session runs with `default_transaction_read_only = on`
//! - `statement_timeout` bounds every catalog and sampling query
//! - Connection strings are redacted in error messages

mod connection;
mod introspection;
mod sampling;
mod type_mapping;


use super::{ConnectionConfig, MetadataProvider, ProviderFeature, RawColumn, ValueCount};
use crate::Result;
use crate::models::{DatabaseType, ForeignKeyEdge, InheritanceEdge, SizeMetrics, UnifiedDataType};
use async_trait::async_trait;
use sqlx::PgPool;

pub use type_mapping::map_postgres_type;

/// Schema inspected when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// PostgreSQL metadata provider.
pub struct PostgresProvider {
    pub pool: PgPool,
    pub config: ConnectionConfig,
    /// Schema whose base tables are inspected
    pub schema: String,
}

impl std::fmt::Debug for PostgresProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresProvider")
            .field("config", &self.config)
            .field("schema", &self.schema)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

#[async_trait]
impl MetadataProvider for PostgresProvider {
    async fn list_tables(&self) -> Result<Vec<String>> {
        introspection::list_tables(&self.pool, &self.schema).await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        introspection::list_columns(&self.pool, &self.schema, table).await
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>> {
        introspection::primary_key(&self.pool, &self.schema, table).await
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyEdge>> {
        introspection::foreign_keys(&self.pool, &self.schema, table).await
    }

    async fn indexes(&self, table: &str) -> Result<Vec<String>> {
        introspection::indexed_columns(&self.pool, &self.schema, table).await
    }

    async fn table_size(&self, table: &str) -> Result<SizeMetrics> {
        introspection::table_size(&self.pool, &self.schema, table).await
    }

    async fn inherited_tables(&self) -> Result<Vec<InheritanceEdge>> {
        introspection::inherited_tables(&self.pool, &self.schema).await
    }

    async fn sample_value_counts(
        &self,
        table: &str,
        column: &str,
        row_limit: u64,
        distinct_cap: u64,
    ) -> Result<Vec<ValueCount>> {
        sampling::sample_value_counts(
            &self.pool,
            &self.schema,
            table,
            column,
            row_limit,
            distinct_cap,
        )
        .await
    }

    fn resolve_type(&self, table: &str, column: &RawColumn) -> Result<UnifiedDataType> {
        map_postgres_type(column).ok_or_else(|| {
            crate::error::DbAnnotateError::unsupported_type(
                table,
                &column.name,
                column.udt_name.as_deref().unwrap_or(&column.type_name),
            )
        })
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn supports_feature(&self, feature: ProviderFeature) -> bool {
        matches!(
            feature,
            ProviderFeature::Inheritance
                | ProviderFeature::TableSizes
                | ProviderFeature::ValueSampling
                | ProviderFeature::UniqueConstraints
        )
    }

    fn max_connections(&self) -> u32 {
        self.config.max_connections
    }
}
