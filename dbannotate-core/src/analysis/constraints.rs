//! Missing-Constraint Inferencer.
//!
//! Proposes foreign keys the schema does not declare, from naming alone:
//! `orders.user_id` points at `users`, `blog_comment.post` at `blog_post`.
//! Results are guesses and are kept apart from declared edges.

use super::config::InferenceMode;
use super::models::{MissingConstraint, NamespaceGroups};
use crate::models::SchemaSnapshot;
use std::collections::BTreeSet;

const TABLE_SUFFIXES: [&str; 4] = ["", "id", "_id", "_ptr_id"];
const COLUMN_SUFFIXES: [&str; 2] = ["", "s"];

/// Table names (without namespace prefix) `column` may refer to.
pub fn referenced_names(column: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for table_suffix in TABLE_SUFFIXES {
        let Some(stem) = column.strip_suffix(table_suffix) else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }
        for column_suffix in COLUMN_SUFFIXES {
            names.insert(format!("{}{}", stem, column_suffix));
        }
    }
    names
}

/// True when a column referring to `names` matches `table`.
fn matches_table(names: &BTreeSet<String>, table: &str, namespaces: &NamespaceGroups) -> bool {
    if names.contains(table) {
        return true;
    }
    namespaces
        .namespace_of(table)
        .and_then(|namespace| table.strip_prefix(namespace))
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|rest| names.contains(rest))
}

/// Infers undeclared foreign keys across the whole snapshot.
///
/// Columns that already carry a declared foreign key are not considered.
/// Candidates are tried in snapshot order; with
/// [`InferenceMode::FirstMatch`] each column yields at most one result.
pub fn infer_missing_constraints(
    snapshot: &SchemaSnapshot,
    namespaces: &NamespaceGroups,
    mode: InferenceMode,
) -> Vec<MissingConstraint> {
    let mut missing = Vec::new();

    for table in &snapshot.tables {
        for column in &table.columns {
            if table.has_foreign_key_from(&column.name) {
                continue;
            }
            let names = referenced_names(&column.name);
            let candidates = snapshot
                .tables
                .iter()
                .filter(|other| other.name != table.name)
                .filter(|other| matches_table(&names, &other.name, namespaces));

            for other in candidates {
                tracing::debug!(
                    "Possible missing constraint {}.{} -> {}",
                    table.name,
                    column.name,
                    other.name
                );
                missing.push(MissingConstraint::new(&table.name, &column.name, &other.name));
                if mode == InferenceMode::FirstMatch {
                    break;
                }
            }
        }
    }

    missing
}
