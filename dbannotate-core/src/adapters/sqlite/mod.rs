//! SQLite metadata provider.
//!
//! # Module Structure
//! - `connection`: connection string parsing and pool setup
//! - `type_mapping`: declared type to unified type via affinity rules
//! - `introspection`: tables, columns, keys, indexes, sizes via `sqlite_master` and PRAGMAs
//! - `sampling`: grouped value sampling
//!
//! # SQLite-Specific Behavior
//! - Table-valued PRAGMA functions (`pragma_table_info(?)`) so names are bound, not spliced
//! - Sizes come from the `dbstat` virtual table when it is compiled in, otherwise zeros
//! - No table inheritance

pub mod connection;
pub mod introspection;
pub mod sampling;
pub mod type_mapping;


use super::{ConnectionConfig, MetadataProvider, ProviderFeature, RawColumn, ValueCount};
use crate::Result;
use crate::models::{DatabaseType, ForeignKeyEdge, SizeMetrics, UnifiedDataType};
use async_trait::async_trait;
use sqlx::SqlitePool;

pub use type_mapping::map_sqlite_type;

/// SQLite metadata provider.
pub struct SqliteProvider {
    pub pool: SqlitePool,
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for SqliteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetadataProvider for SqliteProvider {
    async fn list_tables(&self) -> Result<Vec<String>> {
        introspection::list_tables(&self.pool).await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        introspection::list_columns(&self.pool, table).await
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>> {
        introspection::primary_key(&self.pool, table).await
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyEdge>> {
        introspection::foreign_keys(&self.pool, table).await
    }

    async fn indexes(&self, table: &str) -> Result<Vec<String>> {
        introspection::indexed_columns(&self.pool, table).await
    }

    async fn table_size(&self, table: &str) -> Result<SizeMetrics> {
        introspection::table_size(&self.pool, table).await
    }

    async fn sample_value_counts(
        &self,
        table: &str,
        column: &str,
        row_limit: u64,
        distinct_cap: u64,
    ) -> Result<Vec<ValueCount>> {
        sampling::sample_value_counts(&self.pool, table, column, row_limit, distinct_cap).await
    }

    fn resolve_type(&self, _table: &str, column: &RawColumn) -> Result<UnifiedDataType> {
        Ok(map_sqlite_type(&column.type_name))
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn supports_feature(&self, feature: ProviderFeature) -> bool {
        matches!(
            feature,
            ProviderFeature::TableSizes
                | ProviderFeature::ValueSampling
                | ProviderFeature::UniqueConstraints
        )
    }

    fn max_connections(&self) -> u32 {
        self.config.max_connections
    }
}
