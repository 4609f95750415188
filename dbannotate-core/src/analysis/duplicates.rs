//! Duplicate/Inheritance Detector.

use super::models::{DuplicateCandidate, DuplicateKind};
use crate::models::SchemaSnapshot;
use std::collections::BTreeSet;

/// Minimum shared columns for a containment to count as "could inherit".
const MIN_SHARED_COLUMNS: usize = 3;

/// Tags describing how two column-name sets relate.
pub fn compare_columns(first: &BTreeSet<&str>, second: &BTreeSet<&str>) -> Vec<DuplicateKind> {
    let mut kinds = Vec::new();
    if first.is_empty() || second.is_empty() {
        return kinds;
    }

    if first == second {
        kinds.push(DuplicateKind::SameColumns);
    } else if (first.is_subset(second) || second.is_subset(first))
        && first.intersection(second).count() >= MIN_SHARED_COLUMNS
    {
        kinds.push(DuplicateKind::CouldInherit);
    }
    kinds
}

/// Finds table pairs with identical or nested column sets.
///
/// Pairs are visited once, earlier table first. Pairs already linked by
/// inheritance are skipped.
pub fn detect_duplicates(snapshot: &SchemaSnapshot) -> Vec<DuplicateCandidate> {
    let column_sets: Vec<BTreeSet<&str>> = snapshot
        .tables
        .iter()
        .map(|table| table.column_names().collect())
        .collect();

    let mut candidates = Vec::new();
    for (i, first) in snapshot.tables.iter().enumerate() {
        for (j, second) in snapshot.tables.iter().enumerate().skip(i.saturating_add(1)) {
            if snapshot.inherits(&first.name, &second.name) {
                continue;
            }
            let kinds = compare_columns(&column_sets[i], &column_sets[j]);
            if kinds.is_empty() {
                continue;
            }
            tracing::debug!(
                "Tables '{}' and '{}' look alike: {:?}",
                first.name,
                second.name,
                kinds
            );
            candidates.push(DuplicateCandidate {
                first: first.name.clone(),
                second: second.name.clone(),
                kinds,
            });
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, DatabaseType, InheritanceEdge, Table, UnifiedDataType};

    fn table(name: &str, columns: &[&str]) -> Table {
        let mut table = Table::new(name);
        table.columns = columns
            .iter()
            .map(|column| Column {
                name: (*column).to_string(),
                type_name: "text".to_string(),
                data_type: UnifiedDataType::String { max_length: None },
                max_length: None,
                nullable: true,
                default: None,
                unique: false,
            })
            .collect();
        table
    }

    fn set<'a>(names: &[&'a str]) -> BTreeSet<&'a str> {
        names.iter().copied().collect()
    }

    #[test]
    fn test_compare_columns() {
        assert_eq!(
            compare_columns(&set(&["a", "b"]), &set(&["b", "a"])),
            vec![DuplicateKind::SameColumns]
        );
        assert_eq!(
            compare_columns(&set(&["a", "b", "c"]), &set(&["a", "b", "c", "d"])),
            vec![DuplicateKind::CouldInherit]
        );
        // Containment is checked in both directions
        assert_eq!(
            compare_columns(&set(&["a", "b", "c", "d"]), &set(&["a", "b", "c"])),
            vec![DuplicateKind::CouldInherit]
        );
        assert!(compare_columns(&set(&["a", "b"]), &set(&["a", "b", "c"])).is_empty());
        assert!(compare_columns(&set(&["a", "b", "c", "x"]), &set(&["a", "b", "c", "y"])).is_empty());
        assert!(compare_columns(&set(&[]), &set(&[])).is_empty());
    }

    #[test]
    fn test_identical_tables_are_candidates() {
        let snapshot = SchemaSnapshot::new(
            DatabaseType::Memory,
            vec![
                table("invoice", &["id", "amount", "date"]),
                table("users", &["id", "name"]),
                table("invoice_archive", &["date", "amount", "id"]),
            ],
            Vec::new(),
        );

        let candidates = detect_duplicates(&snapshot);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].pairs("invoice_archive", "invoice"));
        assert_eq!(candidates[0].first, "invoice");
        assert_eq!(candidates[0].kinds, vec![DuplicateKind::SameColumns]);
    }

    #[test]
    fn test_inheritance_suppresses_candidates() {
        let snapshot = SchemaSnapshot::new(
            DatabaseType::Memory,
            vec![
                table("person", &["id", "name", "email"]),
                table("employee", &["id", "name", "email", "salary"]),
                table("contact", &["id", "name", "email"]),
            ],
            vec![InheritanceEdge::new("person", "employee")],
        );

        let candidates = detect_duplicates(&snapshot);
        assert!(!candidates.iter().any(|c| c.pairs("person", "employee")));
        assert!(candidates.iter().any(|c| c.pairs("person", "contact")
            && c.kinds == vec![DuplicateKind::SameColumns]));
        assert!(candidates.iter().any(|c| c.pairs("employee", "contact")
            && c.kinds == vec![DuplicateKind::CouldInherit]));
    }
}
