//! Schema analyzer facade.
//!
//! Runs the builder, then the column statistics pass against the live
//! provider, then the cross-table analyzers over the finished snapshot.

use crate::Result;
use crate::adapters::MetadataProvider;
use crate::builder::build_snapshot;
use crate::models::SchemaSnapshot;
use crate::report::SchemaReport;

use super::config::AnalysisConfig;
use super::constraints::infer_missing_constraints;
use super::duplicates::detect_duplicates;
use super::health::aggregate_health;
use super::models::Annotations;
use super::namespace::classify_namespaces;
use super::statistics::analyze_columns;

/// Orchestrates one analysis run.
///
/// # Example
///
/// ```rust,no_run
/// use dbannotate_core::adapters::create_provider;
/// use dbannotate_core::analysis::{AnalysisConfig, SchemaAnalyzer};
///
/// # async fn example() -> dbannotate_core::Result<()> {
/// let provider = create_provider("sqlite://./app.db").await?;
/// let analyzer = SchemaAnalyzer::new(AnalysisConfig::default())?;
/// let report = analyzer.run(provider.as_ref()).await?;
/// println!("{} issues", report.summary().total_issues());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SchemaAnalyzer {
    config: AnalysisConfig,
}

impl SchemaAnalyzer {
    /// Creates an analyzer after validating `config`.
    ///
    /// # Errors
    /// Returns a configuration error if a threshold is out of range.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Creates an analyzer with default thresholds.
    pub fn with_defaults() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    /// Returns a reference to the analyzer configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Builds the snapshot, analyzes it and assembles the report.
    ///
    /// # Errors
    /// Returns an error only when the provider connection is lost or the
    /// table list cannot be read.
    pub async fn run(&self, provider: &dyn MetadataProvider) -> Result<SchemaReport> {
        let snapshot = self.build(provider).await?;
        let annotations = self.analyze(provider, &snapshot).await?;
        Ok(SchemaReport::assemble(snapshot, annotations))
    }

    /// Builds the schema snapshot.
    ///
    /// # Errors
    /// See [`build_snapshot`].
    pub async fn build(&self, provider: &dyn MetadataProvider) -> Result<SchemaSnapshot> {
        let concurrency = self.config.concurrency_for(provider.max_connections());
        build_snapshot(provider, concurrency).await
    }

    /// Runs every analyzer over `snapshot`.
    ///
    /// Column statistics need the provider for sampling; everything else is
    /// computed from the snapshot alone.
    ///
    /// # Errors
    /// Returns an error only when the provider connection is lost.
    pub async fn analyze(
        &self,
        provider: &dyn MetadataProvider,
        snapshot: &SchemaSnapshot,
    ) -> Result<Annotations> {
        let statistics = analyze_columns(provider, snapshot, &self.config).await?;

        let mut annotations = self.annotate_structure(snapshot);
        annotations.column_issues = statistics.issues;
        annotations.warnings = statistics.warnings;

        tracing::info!(
            "Analysis complete: {} column issues, {} table issues, {} missing constraints, {} duplicate candidates",
            annotations.column_issues.values().map(Vec::len).sum::<usize>(),
            annotations.table_issues.values().map(Vec::len).sum::<usize>(),
            annotations.missing_constraints.len(),
            annotations.duplicates.len()
        );
        Ok(annotations)
    }

    /// Runs the analyzers that need nothing but the snapshot.
    pub fn annotate_structure(&self, snapshot: &SchemaSnapshot) -> Annotations {
        let namespaces = classify_namespaces(snapshot);
        let missing_constraints =
            infer_missing_constraints(snapshot, &namespaces, self.config.inference_mode);

        Annotations {
            column_issues: Default::default(),
            table_issues: aggregate_health(snapshot, &self.config),
            missing_constraints,
            duplicates: detect_duplicates(snapshot),
            namespaces,
            warnings: Vec::new(),
        }
    }
}
