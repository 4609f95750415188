//! Namespace Classifier: groups tables sharing the prefix before their
//! first underscore.

use super::models::NamespaceGroups;
use crate::models::SchemaSnapshot;
use std::collections::BTreeMap;

/// Prefix of `table` before the first `_`, if non-empty.
pub fn table_prefix(table: &str) -> Option<&str> {
    table
        .split_once('_')
        .map(|(prefix, _)| prefix)
        .filter(|prefix| !prefix.is_empty())
}

/// Groups the snapshot's tables by prefix, dropping singleton groups.
pub fn classify_namespaces(snapshot: &SchemaSnapshot) -> NamespaceGroups {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for table in &snapshot.tables {
        if let Some(prefix) = table_prefix(&table.name) {
            groups
                .entry(prefix.to_string())
                .or_default()
                .push(table.name.clone());
        }
    }
    groups.retain(|_, members| members.len() >= 2);

    tracing::debug!("Found {} namespaces", groups.len());
    NamespaceGroups::from_map(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatabaseType, Table};

    fn snapshot(names: &[&str]) -> SchemaSnapshot {
        let tables = names.iter().map(|name| Table::new(*name)).collect();
        SchemaSnapshot::new(DatabaseType::Memory, tables, Vec::new())
    }

    #[test]
    fn test_table_prefix() {
        assert_eq!(table_prefix("blog_post"), Some("blog"));
        assert_eq!(table_prefix("auth_user_groups"), Some("auth"));
        assert_eq!(table_prefix("users"), None);
        assert_eq!(table_prefix("_tmp"), None);
    }

    #[test]
    fn test_groups_shared_prefixes_only() {
        let groups = classify_namespaces(&snapshot(&[
            "blog_post",
            "forum_thread",
            "users",
            "blog_comment",
        ]));

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.members("blog"),
            Some(&["blog_post".to_string(), "blog_comment".to_string()][..])
        );
        assert_eq!(groups.members("forum"), None);
    }

    #[test]
    fn test_underscore_prefixed_tables_are_not_grouped() {
        let groups = classify_namespaces(&snapshot(&["_tmp_a", "_tmp_b"]));
        assert!(groups.is_empty());
    }
}
