//! Table Health Aggregator.

use super::config::AnalysisConfig;
use super::models::TableIssue;
use crate::models::{SchemaSnapshot, Table};
use std::collections::BTreeMap;

/// Health issues of a single table.
pub fn table_health(snapshot: &SchemaSnapshot, table: &Table, config: &AnalysisConfig) -> Vec<TableIssue> {
    let mut issues = Vec::new();

    let rows = table.size.row_count;
    if rows == 0 {
        issues.push(TableIssue::Empty);
    } else if rows < config.min_distinct {
        issues.push(TableIssue::TooSmall { rows });
    }

    if table.primary_key.is_empty()
        && table.foreign_keys.is_empty()
        && !snapshot.is_inherited(&table.name)
    {
        issues.push(TableIssue::NoKey);
    }

    issues
}

/// Health issues of every table that has any, keyed by table name.
pub fn aggregate_health(
    snapshot: &SchemaSnapshot,
    config: &AnalysisConfig,
) -> BTreeMap<String, Vec<TableIssue>> {
    snapshot
        .tables
        .iter()
        .map(|table| (table.name.clone(), table_health(snapshot, table, config)))
        .filter(|(_, issues)| !issues.is_empty())
        .collect()
}
