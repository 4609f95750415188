//! Annotation types produced by the analyzers.
//!
//! Issues are closed sets of tagged variants. They serialize with a `kind`
//! tag and render their human-readable message through `Display`.

use crate::models::ColumnRef;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Reason attached to every inferred relationship.
pub const MISSING_CONSTRAINT_REASON: &str = "missing constraint or ambiguous naming";

/// Renders a sampled value for messages.
///
/// Strings appear verbatim, NULL as `NULL`, anything else as JSON text.
pub fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Value-distribution issue found on a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnIssue {
    /// Only one value was observed
    Constant { value: JsonValue },
    /// Exactly two values on a column not declared boolean
    PseudoBoolean { first: JsonValue, second: JsonValue },
    /// Fewer than `threshold` distinct values on a large table
    LowCardinality { threshold: u64 },
}

impl ColumnIssue {
    /// Summary kind of this issue.
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::Constant { .. } => IssueKind::Constant,
            Self::PseudoBoolean { .. } => IssueKind::PseudoBoolean,
            Self::LowCardinality { .. } => IssueKind::LowCardinality,
        }
    }
}

impl std::fmt::Display for ColumnIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant { value } => write!(f, "value is always \"{}\"", render_value(value)),
            Self::PseudoBoolean { first, second } => write!(
                f,
                "value is always \"{}\" or \"{}\"",
                render_value(first),
                render_value(second)
            ),
            Self::LowCardinality { threshold } => {
                write!(f, "has less than {} distinct values", threshold)
            }
        }
    }
}

/// Health issue found on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableIssue {
    Empty,
    TooSmall { rows: u64 },
    /// No primary key, no foreign key and no inheritance link
    NoKey,
}

impl TableIssue {
    /// Summary kind of this issue.
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::Empty => IssueKind::Empty,
            Self::TooSmall { .. } => IssueKind::TooSmall,
            Self::NoKey => IssueKind::NoKey,
        }
    }
}

impl std::fmt::Display for TableIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty table"),
            Self::TooSmall { rows } => write!(f, "has only {} entries", rows),
            Self::NoKey => write!(f, "has no foreign or primary key"),
        }
    }
}

/// An inferred, undeclared foreign key.
///
/// Kept apart from declared [`crate::models::ForeignKeyEdge`]s: it is a
/// naming-based guess, not a catalog fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingConstraint {
    pub source: ColumnRef,
    pub target_table: String,
}

impl MissingConstraint {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        target_table: impl Into<String>,
    ) -> Self {
        Self {
            source: ColumnRef::new(table, column),
            target_table: target_table.into(),
        }
    }
}

impl std::fmt::Display for MissingConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.source, self.target_table, MISSING_CONSTRAINT_REASON
        )
    }
}

/// Why two tables look like duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    /// Identical column-name sets
    SameColumns,
    /// One column set contains the other
    CouldInherit,
}

impl std::fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SameColumns => write!(f, "same columns, could inherit"),
            Self::CouldInherit => write!(f, "could inherit"),
        }
    }
}

/// An unordered table pair; `first` precedes `second` in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub first: String,
    pub second: String,
    pub kinds: Vec<DuplicateKind>,
}

impl DuplicateCandidate {
    /// True when the pair is `a`/`b` in either order.
    pub fn pairs(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// Prefix -> member tables, only for prefixes shared by two or more tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceGroups {
    groups: BTreeMap<String, Vec<String>>,
}

impl NamespaceGroups {
    pub(crate) fn from_map(groups: BTreeMap<String, Vec<String>>) -> Self {
        Self { groups }
    }

    /// Members of `prefix`, in snapshot order.
    pub fn members(&self, prefix: &str) -> Option<&[String]> {
        self.groups.get(prefix).map(Vec::as_slice)
    }

    /// The namespace `table` belongs to, if any.
    pub fn namespace_of(&self, table: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == table))
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Groups in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no prefix is shared by two or more tables.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Every issue category, for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Constant,
    PseudoBoolean,
    LowCardinality,
    Empty,
    TooSmall,
    NoKey,
    MissingConstraint,
    DuplicateCandidate,
}

impl IssueKind {
    /// Stable snake_case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::PseudoBoolean => "pseudo_boolean",
            Self::LowCardinality => "low_cardinality",
            Self::Empty => "empty",
            Self::TooSmall => "too_small",
            Self::NoKey => "no_key",
            Self::MissingConstraint => "missing_constraint",
            Self::DuplicateCandidate => "duplicate_candidate",
        }
    }

    /// Every kind, in report order.
    pub const ALL: [IssueKind; 8] = [
        IssueKind::Constant,
        IssueKind::PseudoBoolean,
        IssueKind::LowCardinality,
        IssueKind::Empty,
        IssueKind::TooSmall,
        IssueKind::NoKey,
        IssueKind::MissingConstraint,
        IssueKind::DuplicateCandidate,
    ];
}

/// Everything the analyzers add on top of a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// Column issues keyed by column, in issue priority order
    pub column_issues: BTreeMap<ColumnRef, Vec<ColumnIssue>>,
    pub table_issues: BTreeMap<String, Vec<TableIssue>>,
    pub missing_constraints: Vec<MissingConstraint>,
    pub duplicates: Vec<DuplicateCandidate>,
    pub namespaces: NamespaceGroups,
    /// Recoverable failures hit while analyzing
    pub warnings: Vec<String>,
}

impl Annotations {
    /// Issues recorded for `table.column`.
    pub fn column_issues_for(&self, table: &str, column: &str) -> &[ColumnIssue] {
        self.column_issues
            .get(&ColumnRef::new(table, column))
            .map_or(&[], Vec::as_slice)
    }

    /// Issues recorded for `table`.
    pub fn table_issues_for(&self, table: &str) -> &[TableIssue] {
        self.table_issues.get(table).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_messages() {
        let constant = ColumnIssue::Constant { value: json!("x") };
        assert_eq!(constant.to_string(), "value is always \"x\"");

        let pseudo = ColumnIssue::PseudoBoolean {
            first: json!("active"),
            second: json!("inactive"),
        };
        assert_eq!(pseudo.to_string(), "value is always \"active\" or \"inactive\"");

        let numeric = ColumnIssue::PseudoBoolean {
            first: json!(0),
            second: json!(null),
        };
        assert_eq!(numeric.to_string(), "value is always \"0\" or \"NULL\"");

        assert_eq!(
            ColumnIssue::LowCardinality { threshold: 10 }.to_string(),
            "has less than 10 distinct values"
        );
        assert_eq!(TableIssue::Empty.to_string(), "empty table");
        assert_eq!(TableIssue::TooSmall { rows: 3 }.to_string(), "has only 3 entries");
        assert_eq!(TableIssue::NoKey.to_string(), "has no foreign or primary key");
        assert_eq!(
            MissingConstraint::new("orders", "user_id", "users").to_string(),
            "orders.user_id -> users: missing constraint or ambiguous naming"
        );
        assert_eq!(DuplicateKind::SameColumns.to_string(), "same columns, could inherit");
        assert_eq!(DuplicateKind::CouldInherit.to_string(), "could inherit");
    }

    #[test]
    fn test_issues_serialize_with_kind_tag() {
        let json = serde_json::to_value(ColumnIssue::LowCardinality { threshold: 10 }).unwrap();
        assert_eq!(json, json!({"kind": "low_cardinality", "threshold": 10}));

        let json = serde_json::to_value(TableIssue::NoKey).unwrap();
        assert_eq!(json, json!({"kind": "no_key"}));

        let json = serde_json::to_value(DuplicateKind::CouldInherit).unwrap();
        assert_eq!(json, json!("could_inherit"));
    }

    #[test]
    fn test_namespace_groups_lookup() {
        let mut map = BTreeMap::new();
        map.insert(
            "blog".to_string(),
            vec!["blog_post".to_string(), "blog_comment".to_string()],
        );
        let groups = NamespaceGroups::from_map(map);

        assert_eq!(groups.namespace_of("blog_comment"), Some("blog"));
        assert_eq!(groups.namespace_of("forum_thread"), None);
        assert_eq!(groups.members("blog").map(<[String]>::len), Some(2));
        assert_eq!(
            serde_json::to_value(&groups).unwrap(),
            json!({"blog": ["blog_post", "blog_comment"]})
        );
    }

    #[test]
    fn test_issue_kinds() {
        assert_eq!(ColumnIssue::Constant { value: json!(1) }.kind(), IssueKind::Constant);
        assert_eq!(TableIssue::TooSmall { rows: 1 }.kind(), IssueKind::TooSmall);
        assert_eq!(IssueKind::ALL.len(), 8);
        for kind in IssueKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }
}
