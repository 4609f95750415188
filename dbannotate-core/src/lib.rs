//! Schema analysis engine for dbannotate.
//!
//! This crate inspects a relational database's catalog through a
//! [`adapters::MetadataProvider`] and derives a diagnostic model of it:
//! data-quality issues per column and table, foreign keys implied by naming
//! but not declared, tables that look like duplicates, and naming-prefix
//! namespaces.
//!
//! # Read-only Guarantees
//! - Providers only issue catalog queries and bounded `SELECT`s
//! - No credentials stored or logged in any data structures
//!
//! # Architecture
//! - `builder` assembles provider output into an immutable [`SchemaSnapshot`]
//! - `analysis` annotates the snapshot without mutating it
//! - `report` merges both into the structure renderers consume

pub mod adapters;
pub mod analysis;
pub mod builder;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;

// Re-export commonly used types
pub use adapters::{ConnectionConfig, MetadataProvider, ProviderFeature, create_provider};
pub use analysis::{AnalysisConfig, Annotations, InferenceMode, SchemaAnalyzer};
pub use error::{DbAnnotateError, Result};
pub use models::{
    Column, ColumnRef, DatabaseType, ForeignKeyEdge, InheritanceEdge, SchemaSnapshot, SizeMetrics,
    Table, UnifiedDataType,
};
pub use report::{ReportSummary, SchemaReport};
