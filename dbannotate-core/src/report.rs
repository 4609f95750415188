//! Report Assembler.
//!
//! Merges analyzer annotations onto the snapshot. [`SchemaReport`] is the
//! only structure renderers depend on; its JSON form is versioned by
//! [`FORMAT_VERSION`].

use crate::Result;
use crate::analysis::{
    Annotations, ColumnIssue, DuplicateCandidate, IssueKind, MissingConstraint, NamespaceGroups,
    TableIssue,
};
use crate::error::DbAnnotateError;
use crate::models::{
    Column, ColumnRef, DatabaseType, ForeignKeyEdge, InheritanceEdge, SchemaSnapshot, SizeMetrics,
    Table, UnifiedDataType, humanize_bytes, humanize_count,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the JSON report layout.
pub const FORMAT_VERSION: &str = "1.0";

/// A column with its issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    pub type_name: String,
    pub data_type: UnifiedDataType,
    pub max_length: Option<u32>,
    pub nullable: bool,
    pub default: Option<String>,
    pub unique: bool,
    /// Part of the primary key or source of a declared foreign key
    pub is_key: bool,
    pub indexed: bool,
    pub issues: Vec<ColumnIssue>,
    /// `issues` rendered as text, same order
    pub messages: Vec<String>,
}

impl ColumnReport {
    fn new(column: Column, table: &Table, issues: Vec<ColumnIssue>) -> Self {
        let is_key = table.key_columns().contains(&column.name.as_str());
        let indexed = table.indexes.contains(&column.name);
        Self {
            messages: issues.iter().map(ToString::to_string).collect(),
            is_key,
            indexed,
            issues,
            name: column.name,
            type_name: column.type_name,
            data_type: column.data_type,
            max_length: column.max_length,
            nullable: column.nullable,
            default: column.default,
            unique: column.unique,
        }
    }
}

/// Size metrics formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanSize {
    pub table: String,
    pub indexes: String,
    pub total: String,
    pub rows: String,
}

impl From<&SizeMetrics> for HumanSize {
    fn from(size: &SizeMetrics) -> Self {
        Self {
            table: humanize_bytes(size.bytes_no_index),
            indexes: humanize_bytes(size.index_bytes()),
            total: humanize_bytes(size.bytes_total),
            rows: humanize_count(size.row_count),
        }
    }
}

/// A table with its columns and issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub name: String,
    pub namespace: Option<String>,
    pub size: SizeMetrics,
    pub human_size: HumanSize,
    pub primary_key: Vec<String>,
    pub key_columns: Vec<String>,
    pub indexes: Vec<String>,
    pub columns: Vec<ColumnReport>,
    pub issues: Vec<TableIssue>,
    /// `issues` rendered as text, same order
    pub messages: Vec<String>,
}

impl TableReport {
    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Counts over a whole report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub table_count: usize,
    pub column_count: usize,
    pub foreign_key_count: usize,
    pub total_bytes: u64,
    pub total_rows: u64,
    /// Every issue kind, including those with no occurrence
    pub issue_counts: BTreeMap<IssueKind, usize>,
}

impl ReportSummary {
    /// Sum of all per-kind issue counts.
    pub fn total_issues(&self) -> usize {
        self.issue_counts.values().sum()
    }
}

/// Annotated schema ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaReport {
    pub format_version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub collected_at: chrono::DateTime<chrono::Utc>,
    pub database_type: DatabaseType,
    /// Tables in snapshot order
    pub tables: Vec<TableReport>,
    pub foreign_keys: Vec<ForeignKeyEdge>,
    /// Inferred relationships, never mixed with `foreign_keys`
    pub missing_constraints: Vec<MissingConstraint>,
    pub inheritance: Vec<InheritanceEdge>,
    pub duplicates: Vec<DuplicateCandidate>,
    pub namespaces: NamespaceGroups,
    /// Snapshot warnings followed by analysis warnings
    pub warnings: Vec<String>,
}

impl SchemaReport {
    /// Merges `annotations` onto `snapshot`.
    pub fn assemble(snapshot: SchemaSnapshot, mut annotations: Annotations) -> Self {
        let foreign_keys: Vec<ForeignKeyEdge> = snapshot.foreign_keys().cloned().collect();
        let namespaces = annotations.namespaces;

        let tables = snapshot
            .tables
            .into_iter()
            .map(|table| {
                let issues = annotations
                    .table_issues
                    .remove(&table.name)
                    .unwrap_or_default();
                let columns = table
                    .columns
                    .iter()
                    .map(|column| {
                        let column_issues = annotations
                            .column_issues
                            .remove(&ColumnRef::new(&table.name, &column.name))
                            .unwrap_or_default();
                        ColumnReport::new(column.clone(), &table, column_issues)
                    })
                    .collect();

                TableReport {
                    namespace: namespaces.namespace_of(&table.name).map(str::to_string),
                    human_size: HumanSize::from(&table.size),
                    key_columns: table.key_columns().into_iter().map(str::to_string).collect(),
                    messages: issues.iter().map(ToString::to_string).collect(),
                    issues,
                    columns,
                    size: table.size,
                    name: table.name,
                    primary_key: table.primary_key,
                    indexes: table.indexes,
                }
            })
            .collect();

        let mut warnings = snapshot.warnings;
        warnings.append(&mut annotations.warnings);

        Self {
            format_version: FORMAT_VERSION.to_string(),
            generated_at: chrono::Utc::now(),
            collected_at: snapshot.collected_at,
            database_type: snapshot.database_type,
            tables,
            foreign_keys,
            missing_constraints: annotations.missing_constraints,
            inheritance: snapshot.inheritance,
            duplicates: annotations.duplicates,
            namespaces,
            warnings,
        }
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Computes table, column and issue counts.
    pub fn summary(&self) -> ReportSummary {
        let mut issue_counts: BTreeMap<IssueKind, usize> =
            IssueKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        let mut bump = |kind: IssueKind| {
            let count = issue_counts.entry(kind).or_default();
            *count = count.saturating_add(1);
        };

        for table in &self.tables {
            table.issues.iter().for_each(|issue| bump(issue.kind()));
            for column in &table.columns {
                column.issues.iter().for_each(|issue| bump(issue.kind()));
            }
        }
        self.missing_constraints
            .iter()
            .for_each(|_| bump(IssueKind::MissingConstraint));
        self.duplicates
            .iter()
            .for_each(|_| bump(IssueKind::DuplicateCandidate));

        ReportSummary {
            table_count: self.tables.len(),
            column_count: self.tables.iter().map(|t| t.columns.len()).sum(),
            foreign_key_count: self.foreign_keys.len(),
            total_bytes: self
                .tables
                .iter()
                .fold(0u64, |acc, t| acc.saturating_add(t.size.bytes_total)),
            total_rows: self
                .tables
                .iter()
                .fold(0u64, |acc, t| acc.saturating_add(t.size.row_count)),
            issue_counts,
        }
    }

    /// Up to `n` tables by total size, largest first.
    ///
    /// Equal sizes keep snapshot order.
    pub fn largest_tables(&self, n: usize) -> Vec<&TableReport> {
        let mut tables: Vec<&TableReport> = self.tables.iter().collect();
        tables.sort_by(|a, b| b.size.bytes_total.cmp(&a.size.bytes_total));
        tables.truncate(n);
        tables
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| DbAnnotateError::Serialization {
            context: "Failed to encode schema report".to_string(),
            source,
        })
    }
}
