//! Schema analysis.
//!
//! Turns a [`crate::models::SchemaSnapshot`] into annotations:
//! - **Column statistics**: constant, pseudo-boolean and low-cardinality columns
//! - **Namespaces**: tables grouped by name prefix
//! - **Missing constraints**: foreign keys implied by naming but not declared
//! - **Duplicates**: tables whose column sets are equal or nested
//! - **Health**: empty, tiny and keyless tables
//!
//! Only column statistics talk to the database. The other analyzers are
//! pure functions over the snapshot.

mod analyzer;
mod config;
mod constraints;
mod duplicates;
mod health;
mod models;
mod namespace;
mod statistics;

// Re-export public API
pub use analyzer::SchemaAnalyzer;
pub use config::{AnalysisConfig, ConfigValidationError, InferenceMode, MIN_DISTINCT, ROW_LIMIT};
pub use constraints::{infer_missing_constraints, referenced_names};
pub use duplicates::{compare_columns, detect_duplicates};
pub use health::{aggregate_health, table_health};
pub use models::{
    Annotations, ColumnIssue, DuplicateCandidate, DuplicateKind, IssueKind,
    MISSING_CONSTRAINT_REASON, MissingConstraint, NamespaceGroups, TableIssue, render_value,
};
pub use namespace::{classify_namespaces, table_prefix};
pub use statistics::{StatisticsOutcome, analyze_columns, classify_distribution, is_eligible};
