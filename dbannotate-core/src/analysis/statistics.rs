//! Column Statistics Analyzer.
//!
//! Samples value distributions of columns on tables large enough for the
//! numbers to mean something and classifies each column as constant,
//! pseudo-boolean or low-cardinality.

use super::config::AnalysisConfig;
use super::models::ColumnIssue;
use crate::Result;
use crate::adapters::{MetadataProvider, ProviderFeature, ValueCount};
use crate::models::{Column, ColumnRef, SchemaSnapshot, Table};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::time::Duration;

/// Issues and recoveries of one statistics pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsOutcome {
    /// Issues per sampled column
    pub issues: BTreeMap<ColumnRef, Vec<ColumnIssue>>,
    /// One message per skipped column
    pub warnings: Vec<String>,
    /// Columns whose sample was read successfully
    pub sampled_columns: usize,
}

/// True when `table` has enough rows to be sampled.
pub fn is_eligible(table: &Table, config: &AnalysisConfig) -> bool {
    table.size.row_count >= config.min_distinct
}

/// Classifies one sampled distribution.
///
/// Rules apply in priority order and at most one issue is returned.
pub fn classify_distribution(
    counts: &[ValueCount],
    column: &Column,
    row_count: u64,
    config: &AnalysisConfig,
) -> Option<ColumnIssue> {
    match counts {
        [] => None,
        [only] if only.count > 1 => Some(ColumnIssue::Constant {
            value: only.value.clone(),
        }),
        [first, second] if !column.data_type.is_boolean() => Some(ColumnIssue::PseudoBoolean {
            first: first.value.clone(),
            second: second.value.clone(),
        }),
        _ if !column.data_type.is_enumeration()
            && row_count >= config.low_cardinality_rows()
            && (counts.len() as u64) < config.min_distinct =>
        {
            Some(ColumnIssue::LowCardinality {
                threshold: config.min_distinct,
            })
        }
        _ => None,
    }
}

/// Samples every column of every eligible table.
///
/// Queries run `config.concurrency_for(provider.max_connections())` at a
/// time. A rejected sample skips that column with a warning.
///
/// # Errors
/// Only a lost provider connection is returned.
pub async fn analyze_columns(
    provider: &dyn MetadataProvider,
    snapshot: &SchemaSnapshot,
    config: &AnalysisConfig,
) -> Result<StatisticsOutcome> {
    if !config.sample_values {
        tracing::info!("Value sampling disabled, skipping column statistics");
        return Ok(StatisticsOutcome::default());
    }
    if !provider.supports_feature(ProviderFeature::ValueSampling) {
        tracing::info!(
            "{} provider cannot sample values, skipping column statistics",
            provider.database_type()
        );
        return Ok(StatisticsOutcome::default());
    }

    let targets: Vec<(&Table, &Column)> = snapshot
        .tables
        .iter()
        .filter(|table| is_eligible(table, config))
        .flat_map(|table| table.columns.iter().map(move |column| (table, column)))
        .collect();

    let concurrency = config.concurrency_for(provider.max_connections());
    tracing::info!(
        "Sampling {} columns across {} eligible tables ({} at a time)",
        targets.len(),
        snapshot
            .tables
            .iter()
            .filter(|t| is_eligible(t, config))
            .count(),
        concurrency
    );

    let sampled: Vec<(&Table, &Column, Result<Vec<ValueCount>>)> = stream::iter(targets)
        .map(|(table, column)| async move {
            if let Some(ms) = config.throttle_ms {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            let counts = provider
                .sample_value_counts(
                    &table.name,
                    &column.name,
                    config.row_limit,
                    config.distinct_cap(),
                )
                .await;
            match counts {
                Err(e) if e.is_fatal() => Err(e),
                other => Ok((table, column, other)),
            }
        })
        .buffered(concurrency)
        .try_collect()
        .await?;

    let mut outcome = StatisticsOutcome::default();
    for (table, column, counts) in sampled {
        match counts {
            Ok(counts) => {
                outcome.sampled_columns = outcome.sampled_columns.saturating_add(1);
                tracing::debug!(
                    "Sampled {}.{}: {} distinct values",
                    table.name,
                    column.name,
                    counts.len()
                );
                if let Some(issue) =
                    classify_distribution(&counts, column, table.size.row_count, config)
                {
                    outcome
                        .issues
                        .entry(ColumnRef::new(&table.name, &column.name))
                        .or_default()
                        .push(issue);
                }
            }
            Err(e) => {
                let warning = format!(
                    "Skipped statistics for '{}.{}': {}",
                    table.name, column.name, e
                );
                tracing::warn!("{}", warning);
                outcome.warnings.push(warning);
            }
        }
    }

    Ok(outcome)
}
