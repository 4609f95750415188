//! Schema Model Builder.
//!
//! Fetches every table's metadata from a [`MetadataProvider`] and assembles
//! the immutable [`SchemaSnapshot`]. Per-item failures degrade the snapshot
//! instead of aborting it:
//! - an unsupported column type drops that column
//! - a failed key, index or size query leaves that fact empty or zero
//! - a declared foreign key whose endpoint is not in the snapshot is dropped
//!
//! Each recovery is logged and recorded in [`SchemaSnapshot::warnings`].
//! Only a lost provider connection aborts the build.

use crate::Result;
use crate::adapters::{MetadataProvider, ProviderFeature};
use crate::models::{Column, SchemaSnapshot, SizeMetrics, Table};
use futures::stream::{self, StreamExt, TryStreamExt};

/// Builds a snapshot with up to `concurrency` tables fetched at once.
///
/// Tables keep the provider's order regardless of concurrency.
///
/// # Errors
/// Returns the provider's error if the table list cannot be read or the
/// connection is lost part way through.
pub async fn build_snapshot(
    provider: &dyn MetadataProvider,
    concurrency: usize,
) -> Result<SchemaSnapshot> {
    let table_names = provider.list_tables().await?;
    tracing::info!(
        "Building {} schema snapshot for {} tables",
        provider.database_type(),
        table_names.len()
    );

    let mut warnings = Vec::new();

    let inheritance = if provider.supports_feature(ProviderFeature::Inheritance) {
        recover(
            provider.inherited_tables().await,
            "inheritance edges",
            &mut warnings,
        )?
        .unwrap_or_default()
    } else {
        Vec::new()
    };

    let built: Vec<(Table, Vec<String>)> = stream::iter(table_names.iter())
        .map(|name| build_table(provider, name))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut tables = Vec::with_capacity(built.len());
    for (table, table_warnings) in built {
        warnings.extend(table_warnings);
        tables.push(table);
    }

    let mut snapshot = SchemaSnapshot::new(provider.database_type(), tables, inheritance);
    for warning in warnings {
        snapshot.add_warning(warning);
    }
    drop_dangling_foreign_keys(&mut snapshot);

    tracing::info!(
        "Snapshot complete: {} tables, {} columns, {} foreign keys, {} warnings",
        snapshot.tables.len(),
        snapshot.column_count(),
        snapshot.foreign_keys().count(),
        snapshot.warnings.len()
    );
    Ok(snapshot)
}

async fn build_table(provider: &dyn MetadataProvider, name: &str) -> Result<(Table, Vec<String>)> {
    let mut warnings = Vec::new();
    let mut table = Table::new(name);

    let raw_columns = recover(
        provider.list_columns(name).await,
        &format!("columns of '{}'", name),
        &mut warnings,
    )?
    .unwrap_or_default();

    let unique_supported = provider.supports_feature(ProviderFeature::UniqueConstraints);
    for raw in raw_columns {
        match provider.resolve_type(name, &raw) {
            Ok(data_type) => table.columns.push(Column {
                max_length: raw.max_length.or_else(|| data_type.max_length()),
                unique: raw.unique && unique_supported,
                name: raw.name,
                type_name: raw.type_name,
                data_type,
                nullable: raw.nullable,
                default: raw.default,
            }),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                let warning = format!("Skipped column '{}.{}': {}", name, raw.name, e);
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    table.primary_key = recover(
        provider.primary_key(name).await,
        &format!("primary key of '{}'", name),
        &mut warnings,
    )?
    .unwrap_or_default();

    table.foreign_keys = recover(
        provider.foreign_keys(name).await,
        &format!("foreign keys of '{}'", name),
        &mut warnings,
    )?
    .unwrap_or_default();

    table.indexes = recover(
        provider.indexes(name).await,
        &format!("indexes of '{}'", name),
        &mut warnings,
    )?
    .unwrap_or_default();

    table.size = recover(
        provider.table_size(name).await,
        &format!("size of '{}'", name),
        &mut warnings,
    )?
    .unwrap_or_else(SizeMetrics::default);

    tracing::debug!(
        "Collected table '{}' with {} columns, {} foreign keys, {} rows",
        table.name,
        table.columns.len(),
        table.foreign_keys.len(),
        table.size.row_count
    );
    Ok((table, warnings))
}

/// Passes fatal errors through and turns the rest into a warning.
fn recover<T>(result: Result<T>, what: &str, warnings: &mut Vec<String>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            let warning = format!("Could not read {}: {}", what, e);
            tracing::warn!("{}", warning);
            warnings.push(warning);
            Ok(None)
        }
    }
}

/// Removes declared foreign keys whose source or target column is unknown.
fn drop_dangling_foreign_keys(snapshot: &mut SchemaSnapshot) {
    let mut dangling = Vec::new();
    for table in &snapshot.tables {
        for edge in &table.foreign_keys {
            if !snapshot.has_column(&edge.source.table, &edge.source.column)
                || !snapshot.has_column(&edge.target.table, &edge.target.column)
            {
                dangling.push(edge.clone());
            }
        }
    }

    for edge in dangling {
        let warning = format!(
            "Dropped foreign key {} -> {}: column not in snapshot",
            edge.source, edge.target
        );
        tracing::warn!("{}", warning);
        snapshot.add_warning(warning);
        for table in &mut snapshot.tables {
            table.foreign_keys.retain(|fk| *fk != edge);
        }
    }
}
