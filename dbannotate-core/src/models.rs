//! Schema snapshot data model.
//!
//! The snapshot is a flat, name-keyed picture of the inspected database.
//! Tables own their columns; edges between tables are plain tuples of names
//! rather than references, so mutually referencing tables need no shared
//! ownership. Once the builder returns a [`SchemaSnapshot`] it is never
//! mutated: analyzers read it and produce separate annotation sets.

use serde::{Deserialize, Serialize};

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
    /// Metadata supplied directly by the host, no live backend
    Memory,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
            DatabaseType::Memory => write!(f, "in-memory"),
        }
    }
}

/// Unified data type representation across database engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnifiedDataType {
    /// String/text types with optional length
    String { max_length: Option<u32> },
    /// Integer types with bit width
    Integer { bits: u8, signed: bool },
    /// Floating point and decimal types
    Float { precision: Option<u8> },
    /// Boolean type
    Boolean,
    /// Date and time types
    DateTime { with_timezone: bool },
    /// Date only
    Date,
    /// Time only
    Time { with_timezone: bool },
    /// Binary data
    Binary { max_length: Option<u32> },
    /// JSON/JSONB data
    Json,
    /// UUID type
    Uuid,
    /// Array types
    Array { element_type: Box<UnifiedDataType> },
    /// Enumerated type with a closed set of labels
    Enumeration { name: String },
    /// Custom/database-specific types the provider still accepts
    Custom { type_name: String },
}

impl UnifiedDataType {
    /// True for declared boolean columns.
    pub fn is_boolean(&self) -> bool {
        matches!(self, UnifiedDataType::Boolean)
    }

    /// True for enumerated types.
    pub fn is_enumeration(&self) -> bool {
        matches!(self, UnifiedDataType::Enumeration { .. })
    }

    /// Declared length limit for string and binary types.
    pub fn max_length(&self) -> Option<u32> {
        match self {
            UnifiedDataType::String { max_length } | UnifiedDataType::Binary { max_length } => {
                *max_length
            }
            _ => None,
        }
    }
}

/// Database column information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Type name as declared in the backend catalog
    pub type_name: String,
    pub data_type: UnifiedDataType,
    pub max_length: Option<u32>,
    pub nullable: bool,
    pub default: Option<String>,
    pub unique: bool,
}

/// Storage and row metrics for a table.
///
/// Providers report zeros when the backend refuses size queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeMetrics {
    pub bytes_no_index: u64,
    pub bytes_total: u64,
    pub row_count: u64,
}

impl SizeMetrics {
    /// Creates size metrics from raw values.
    pub fn new(bytes_no_index: u64, bytes_total: u64, row_count: u64) -> Self {
        Self {
            bytes_no_index,
            bytes_total,
            row_count,
        }
    }

    /// Bytes used by indexes and other auxiliary relations.
    pub fn index_bytes(&self) -> u64 {
        self.bytes_total.saturating_sub(self.bytes_no_index)
    }

    /// Mean total bytes per row, 0 for empty tables.
    pub fn mean_row_bytes(&self) -> u64 {
        self.bytes_total.checked_div(self.row_count).unwrap_or(0)
    }
}

/// A (table, column) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    /// Creates a column reference.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A declared foreign key from one column to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    pub source: ColumnRef,
    pub target: ColumnRef,
}

impl ForeignKeyEdge {
    /// Creates an edge `source_table.source_column -> target_table.target_column`.
    pub fn new(
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source: ColumnRef::new(source_table, source_column),
            target: ColumnRef::new(target_table, target_column),
        }
    }
}

/// A backend-reported table inheritance link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InheritanceEdge {
    pub parent: String,
    pub child: String,
}

impl InheritanceEdge {
    /// Creates an inheritance edge.
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }

    /// True when the edge connects `a` and `b` in either direction.
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.parent == a && self.child == b) || (self.parent == b && self.child == a)
    }

    /// True when `table` is the parent or the child.
    pub fn involves(&self, table: &str) -> bool {
        self.parent == table || self.child == table
    }
}

/// Database table information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in provider order
    pub columns: Vec<Column>,
    pub size: SizeMetrics,
    pub primary_key: Vec<String>,
    /// Declared foreign keys whose source is this table
    pub foreign_keys: Vec<ForeignKeyEdge>,
    /// Indexed column names, deduplicated, in provider order
    pub indexes: Vec<String>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            size: SizeMetrics::default(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Primary key columns followed by foreign key source columns, deduplicated.
    pub fn key_columns(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        let fk_columns = self.foreign_keys.iter().map(|fk| fk.source.column.as_str());
        for name in self.primary_key.iter().map(String::as_str).chain(fk_columns) {
            if !keys.contains(&name) {
                keys.push(name);
            }
        }
        keys
    }

    /// True when a declared foreign key starts at `column`.
    pub fn has_foreign_key_from(&self, column: &str) -> bool {
        self.foreign_keys.iter().any(|fk| fk.source.column == column)
    }
}

/// Immutable picture of the inspected schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub database_type: DatabaseType,
    /// Tables in provider order
    pub tables: Vec<Table>,
    pub inheritance: Vec<InheritanceEdge>,
    /// Human-readable notes about skipped or degraded items
    pub warnings: Vec<String>,
    pub collected_at: chrono::DateTime<chrono::Utc>,
}

impl SchemaSnapshot {
    /// Creates a snapshot from already collected parts.
    pub fn new(
        database_type: DatabaseType,
        tables: Vec<Table>,
        inheritance: Vec<InheritanceEdge>,
    ) -> Self {
        Self {
            database_type,
            tables,
            inheritance,
            warnings: Vec::new(),
            collected_at: chrono::Utc::now(),
        }
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// True when `table.column` exists in the snapshot.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.table(table)
            .is_some_and(|t| t.column(column).is_some())
    }

    /// All declared foreign keys, grouped by source table in table order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKeyEdge> {
        self.tables.iter().flat_map(|t| t.foreign_keys.iter())
    }

    /// True when `table` is a parent or child in any inheritance edge.
    pub fn is_inherited(&self, table: &str) -> bool {
        self.inheritance.iter().any(|edge| edge.involves(table))
    }

    /// True when `a` and `b` are linked by an inheritance edge.
    pub fn inherits(&self, a: &str, b: &str) -> bool {
        self.inheritance.iter().any(|edge| edge.links(a, b))
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Records a warning about a degraded item.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Formats a byte count with binary prefixes, truncated to an integer.
///
/// ```rust
/// use dbannotate_core::models::humanize_bytes;
///
/// assert_eq!(humanize_bytes(512), "512B");
/// assert_eq!(humanize_bytes(8192), "8KiB");
/// ```
pub fn humanize_bytes(bytes: u64) -> String {
    humanize(bytes, 1024, &["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"])
}

/// Formats a row count with decimal prefixes, truncated to an integer.
///
/// ```rust
/// use dbannotate_core::models::humanize_count;
///
/// assert_eq!(humanize_count(999), "999");
/// assert_eq!(humanize_count(12_500), "12k");
/// ```
pub fn humanize_count(count: u64) -> String {
    humanize(count, 1000, &["", "k", "M", "G", "T", "P", "E"])
}

fn humanize(mut value: u64, base: u64, units: &[&str]) -> String {
    let mut unit = 0usize;
    while value >= base && unit.saturating_add(1) < units.len() {
        value /= base;
        unit = unit.saturating_add(1);
    }
    format!("{}{}", value, units.get(unit).copied().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            type_name: "integer".to_string(),
            data_type: UnifiedDataType::Integer {
                bits: 32,
                signed: true,
            },
            max_length: None,
            nullable: false,
            default: None,
            unique: false,
        }
    }

    #[test]
    fn test_key_columns_deduplicates_pk_and_fk() {
        let mut table = Table::new("orders");
        table.columns = vec![column("id"), column("user_id")];
        table.primary_key = vec!["id".to_string()];
        table.foreign_keys = vec![
            ForeignKeyEdge::new("orders", "user_id", "users", "id"),
            ForeignKeyEdge::new("orders", "id", "legacy_orders", "id"),
        ];

        assert_eq!(table.key_columns(), vec!["id", "user_id"]);
        assert!(table.has_foreign_key_from("user_id"));
        assert!(!table.has_foreign_key_from("total"));
    }

    #[test]
    fn test_inheritance_edge_links_both_directions() {
        let edge = InheritanceEdge::new("animal", "dog");
        assert!(edge.links("animal", "dog"));
        assert!(edge.links("dog", "animal"));
        assert!(!edge.links("dog", "cat"));
        assert!(edge.involves("animal"));
        assert!(edge.involves("dog"));
        assert!(!edge.involves("cat"));
    }

    #[test]
    fn test_snapshot_lookups() {
        let mut users = Table::new("users");
        users.columns = vec![column("id")];
        let mut orders = Table::new("orders");
        orders.columns = vec![column("id"), column("user_id")];
        orders.foreign_keys = vec![ForeignKeyEdge::new("orders", "user_id", "users", "id")];

        let snapshot = SchemaSnapshot::new(
            DatabaseType::Memory,
            vec![users, orders],
            vec![InheritanceEdge::new("users", "admins")],
        );

        assert!(snapshot.table("orders").is_some());
        assert!(snapshot.table("missing").is_none());
        assert!(snapshot.has_column("orders", "user_id"));
        assert!(!snapshot.has_column("orders", "total"));
        assert_eq!(snapshot.foreign_keys().count(), 1);
        assert_eq!(snapshot.column_count(), 3);
        assert!(snapshot.is_inherited("users"));
        assert!(snapshot.is_inherited("admins"));
        assert!(!snapshot.is_inherited("orders"));
        assert!(snapshot.inherits("admins", "users"));
    }

    #[test]
    fn test_size_metrics_derived_values() {
        let size = SizeMetrics::new(8192, 16384, 100);
        assert_eq!(size.index_bytes(), 8192);
        assert_eq!(size.mean_row_bytes(), 163);
        assert_eq!(SizeMetrics::default().mean_row_bytes(), 0);
        assert_eq!(SizeMetrics::new(10, 5, 1).index_bytes(), 0);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize_bytes(0), "0B");
        assert_eq!(humanize_bytes(1023), "1023B");
        assert_eq!(humanize_bytes(1024), "1KiB");
        assert_eq!(humanize_bytes(5 * 1024 * 1024 + 17), "5MiB");
        assert_eq!(humanize_count(1000), "1k");
        assert_eq!(humanize_count(2_500_000), "2M");
        assert_eq!(humanize_count(u64::MAX), "18E");
    }

    #[test]
    fn test_unified_type_helpers() {
        assert!(UnifiedDataType::Boolean.is_boolean());
        assert!(
            UnifiedDataType::Enumeration {
                name: "mood".to_string()
            }
            .is_enumeration()
        );
        assert_eq!(
            UnifiedDataType::String {
                max_length: Some(64)
            }
            .max_length(),
            Some(64)
        );
        assert_eq!(UnifiedDataType::Json.max_length(), None);
    }

    #[test]
    fn test_database_type_display() {
        assert_eq!(DatabaseType::PostgreSQL.to_string(), "PostgreSQL");
        assert_eq!(DatabaseType::SQLite.to_string(), "SQLite");
        assert_eq!(DatabaseType::Memory.to_string(), "in-memory");
    }
}
