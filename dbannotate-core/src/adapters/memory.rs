//! In-memory metadata provider.
//!
//! Holds a schema description supplied by the host instead of querying a
//! backend. Used by tests and by hosts that already have catalog data at hand.

use super::{MetadataProvider, ProviderFeature, RawColumn, ValueCount, parse_type_with_length};
use crate::Result;
use crate::error::DbAnnotateError;
use crate::models::{DatabaseType, ForeignKeyEdge, InheritanceEdge, SizeMetrics, UnifiedDataType};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    name: String,
    columns: Vec<RawColumn>,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKeyEdge>,
    indexes: Vec<String>,
    size: SizeMetrics,
    samples: HashMap<String, Vec<ValueCount>>,
    failing_samples: HashSet<String>,
    connection_lost: bool,
}

/// Fixture provider built up with `with_*` methods.
///
/// Tables are reported in the order they were first mentioned.
///
/// # Example
/// ```rust
/// use dbannotate_core::adapters::{MemoryProvider, MetadataProvider, RawColumn};
/// use dbannotate_core::models::SizeMetrics;
///
/// # async fn example() -> dbannotate_core::Result<()> {
/// let provider = MemoryProvider::new()
///     .with_column("users", RawColumn::new("id", "integer").with_nullable(false))
///     .with_primary_key("users", &["id"])
///     .with_size("users", SizeMetrics::new(8192, 16384, 42));
///
/// assert_eq!(provider.list_tables().await?, vec!["users".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    tables: Vec<MemoryTable>,
    inheritance: Vec<InheritanceEdge>,
    features: HashSet<ProviderFeature>,
    max_connections: u32,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            inheritance: Vec::new(),
            features: [
                ProviderFeature::Inheritance,
                ProviderFeature::TableSizes,
                ProviderFeature::ValueSampling,
                ProviderFeature::UniqueConstraints,
            ]
            .into_iter()
            .collect(),
            max_connections: 4,
        }
    }
}

impl MemoryProvider {
    /// Creates an empty provider supporting every feature.
    pub fn new() -> Self {
        Self::default()
    }

    fn table_mut(&mut self, name: &str) -> &mut MemoryTable {
        let position = match self.tables.iter().position(|t| t.name == name) {
            Some(position) => position,
            None => {
                self.tables.push(MemoryTable {
                    name: name.to_string(),
                    ..Default::default()
                });
                self.tables.len().saturating_sub(1)
            }
        };
        &mut self.tables[position]
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        let table = self
            .tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DbAnnotateError::query_failed(format!("no such table: {}", name)))?;

        if table.connection_lost {
            return Err(DbAnnotateError::connection_failed(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        Ok(table)
    }

    /// Adds a table without columns.
    pub fn with_table(mut self, name: &str) -> Self {
        self.table_mut(name);
        self
    }

    /// Appends a column, creating the table if needed.
    pub fn with_column(mut self, table: &str, column: RawColumn) -> Self {
        self.table_mut(table).columns.push(column);
        self
    }

    /// Sets the primary key columns.
    pub fn with_primary_key(mut self, table: &str, columns: &[&str]) -> Self {
        self.table_mut(table).primary_key = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Declares a foreign key on the edge's source table.
    pub fn with_foreign_key(mut self, edge: ForeignKeyEdge) -> Self {
        let source = edge.source.table.clone();
        self.table_mut(&source).foreign_keys.push(edge);
        self
    }

    /// Marks a column as indexed.
    pub fn with_index(mut self, table: &str, column: &str) -> Self {
        let table = self.table_mut(table);
        if !table.indexes.iter().any(|c| c == column) {
            table.indexes.push(column.to_string());
        }
        self
    }

    /// Sets size metrics.
    pub fn with_size(mut self, table: &str, size: SizeMetrics) -> Self {
        self.table_mut(table).size = size;
        self
    }

    /// Adds an inheritance edge.
    pub fn with_inheritance(mut self, parent: &str, child: &str) -> Self {
        self.inheritance.push(InheritanceEdge::new(parent, child));
        self
    }

    /// Sets the grouped contents of a column.
    ///
    /// Groups are treated as consecutive runs of rows, so a `row_limit`
    /// smaller than the total count truncates the later groups.
    pub fn with_value_counts(mut self, table: &str, column: &str, counts: Vec<ValueCount>) -> Self {
        self.table_mut(table).samples.insert(column.to_string(), counts);
        self
    }

    /// Makes sampling of `table.column` fail with a query error.
    pub fn with_failing_sample(mut self, table: &str, column: &str) -> Self {
        self.table_mut(table).failing_samples.insert(column.to_string());
        self
    }

    /// Makes every call touching `table` fail as if the connection dropped.
    pub fn with_connection_loss(mut self, table: &str) -> Self {
        self.table_mut(table).connection_lost = true;
        self
    }

    /// Replaces the supported feature set.
    pub fn with_features(mut self, features: &[ProviderFeature]) -> Self {
        self.features = features.iter().copied().collect();
        self
    }

    /// Sets the reported connection capacity.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

#[async_trait]
impl MetadataProvider for MemoryProvider {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table)?.primary_key.clone())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyEdge>> {
        Ok(self.table(table)?.foreign_keys.clone())
    }

    async fn indexes(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table)?.indexes.clone())
    }

    async fn table_size(&self, table: &str) -> Result<SizeMetrics> {
        let size = self.table(table)?.size;
        if self.supports_feature(ProviderFeature::TableSizes) {
            Ok(size)
        } else {
            Ok(SizeMetrics::new(0, 0, size.row_count))
        }
    }

    async fn inherited_tables(&self) -> Result<Vec<InheritanceEdge>> {
        Ok(self.inheritance.clone())
    }

    async fn sample_value_counts(
        &self,
        table: &str,
        column: &str,
        row_limit: u64,
        distinct_cap: u64,
    ) -> Result<Vec<ValueCount>> {
        let entry = self.table(table)?;
        if entry.failing_samples.contains(column) {
            return Err(DbAnnotateError::query_failed(format!(
                "sampling {}.{} was rejected",
                table, column
            )));
        }
        if entry.columns.iter().all(|c| c.name != column) {
            return Err(DbAnnotateError::query_failed(format!(
                "no such column: {}.{}",
                table, column
            )));
        }

        let mut remaining = row_limit;
        let mut groups = Vec::new();
        for group in entry.samples.get(column).into_iter().flatten() {
            if remaining == 0 || groups.len() as u64 >= distinct_cap {
                break;
            }
            let taken = group.count.min(remaining);
            remaining = remaining.saturating_sub(taken);
            groups.push(ValueCount::new(group.value.clone(), taken));
        }
        Ok(groups)
    }

    fn resolve_type(&self, table: &str, column: &RawColumn) -> Result<UnifiedDataType> {
        if column.is_enum {
            return Ok(UnifiedDataType::Enumeration {
                name: column.type_name.clone(),
            });
        }
        map_generic_type(&column.type_name, column.max_length)
            .ok_or_else(|| DbAnnotateError::unsupported_type(table, &column.name, &column.type_name))
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Memory
    }

    fn supports_feature(&self, feature: ProviderFeature) -> bool {
        self.features.contains(&feature)
    }

    fn max_connections(&self) -> u32 {
        self.max_connections
    }
}

/// Maps portable SQL type names onto the unified type system.
///
/// A trailing `[]` declares an array of the element type.
fn map_generic_type(type_name: &str, max_length: Option<u32>) -> Option<UnifiedDataType> {
    let lowered = type_name.trim().to_lowercase();

    if let Some(element) = lowered.strip_suffix("[]") {
        let element_type = map_generic_type(element, None)?;
        return Some(UnifiedDataType::Array {
            element_type: Box::new(element_type),
        });
    }

    let (base, declared_length) = parse_type_with_length(&lowered);
    let length = max_length.or(declared_length);

    let data_type = match base.as_str() {
        "smallint" | "int2" => UnifiedDataType::Integer {
            bits: 16,
            signed: true,
        },
        "int" | "integer" | "int4" | "serial" => UnifiedDataType::Integer {
            bits: 32,
            signed: true,
        },
        "bigint" | "int8" | "bigserial" => UnifiedDataType::Integer {
            bits: 64,
            signed: true,
        },
        "text" | "varchar" | "char" | "character varying" | "string" => UnifiedDataType::String {
            max_length: length,
        },
        "bool" | "boolean" => UnifiedDataType::Boolean,
        "real" | "float" | "float4" => UnifiedDataType::Float { precision: Some(24) },
        "double" | "double precision" | "float8" => UnifiedDataType::Float { precision: Some(53) },
        "numeric" | "decimal" => UnifiedDataType::Float { precision: None },
        "date" => UnifiedDataType::Date,
        "time" => UnifiedDataType::Time {
            with_timezone: false,
        },
        "timestamp" | "datetime" => UnifiedDataType::DateTime {
            with_timezone: false,
        },
        "timestamptz" => UnifiedDataType::DateTime {
            with_timezone: true,
        },
        "blob" | "bytea" | "binary" => UnifiedDataType::Binary { max_length: length },
        "json" | "jsonb" => UnifiedDataType::Json,
        "uuid" => UnifiedDataType::Uuid,
        _ => return None,
    };
    Some(data_type)
}
