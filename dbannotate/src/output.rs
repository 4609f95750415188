//! Report rendering and output.

use anyhow::Context;
use clap::ValueEnum;
use dbannotate_core::SchemaReport;
use dbannotate_core::models::humanize_bytes;
use std::fmt::Write as _;
use std::path::Path;

/// Tables listed in the text report's size section.
const LARGEST_TABLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON report
    Json,
    /// Human-readable summary
    Text,
}

/// Renders `report` in the requested format.
pub fn render(report: &SchemaReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(report.to_json_pretty()?),
        OutputFormat::Text => {
            let mut out = String::new();
            write_text(report, &mut out).context("Failed to format text report")?;
            Ok(out)
        }
    }
}

/// Writes the rendered report to `path`, or stdout when absent.
pub async fn write_report(
    report: &SchemaReport,
    format: OutputFormat,
    path: Option<&Path>,
) -> anyhow::Result<()> {
    let rendered = render(report, format)?;
    match path {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{}", rendered.trim_end()),
    }
    Ok(())
}

fn write_text(report: &SchemaReport, out: &mut String) -> std::fmt::Result {
    let summary = report.summary();
    writeln!(
        out,
        "{} schema: {} tables, {} columns, {} declared foreign keys, {}",
        report.database_type,
        summary.table_count,
        summary.column_count,
        summary.foreign_key_count,
        humanize_bytes(summary.total_bytes)
    )?;

    writeln!(out, "\nLargest tables:")?;
    for table in report.largest_tables(LARGEST_TABLES) {
        writeln!(
            out,
            "  {:<32} {:>8} total, {:>8} indexes, {:>6} rows",
            table.name, table.human_size.total, table.human_size.indexes, table.human_size.rows
        )?;
    }

    writeln!(out, "\nTable issues:")?;
    for table in &report.tables {
        let column_messages: Vec<(&str, &String)> = table
            .columns
            .iter()
            .flat_map(|c| c.messages.iter().map(move |m| (c.name.as_str(), m)))
            .collect();
        if table.messages.is_empty() && column_messages.is_empty() {
            continue;
        }
        writeln!(out, "  {}", table.name)?;
        for message in &table.messages {
            writeln!(out, "    {}", message)?;
        }
        for (column, message) in column_messages {
            writeln!(out, "    {}: {}", column, message)?;
        }
    }

    if !report.missing_constraints.is_empty() {
        writeln!(out, "\nMissing constraints:")?;
        for missing in &report.missing_constraints {
            writeln!(out, "  {}", missing)?;
        }
    }

    if !report.duplicates.is_empty() {
        writeln!(out, "\nDuplicate candidates:")?;
        for duplicate in &report.duplicates {
            let kinds: Vec<String> = duplicate.kinds.iter().map(ToString::to_string).collect();
            writeln!(
                out,
                "  {} / {}: {}",
                duplicate.first,
                duplicate.second,
                kinds.join("; ")
            )?;
        }
    }

    if !report.namespaces.is_empty() {
        writeln!(out, "\nNamespaces:")?;
        for (prefix, members) in report.namespaces.iter() {
            writeln!(out, "  {}: {}", prefix, members.join(", "))?;
        }
    }

    if !report.warnings.is_empty() {
        writeln!(out, "\nWarnings:")?;
        for warning in &report.warnings {
            writeln!(out, "  {}", warning)?;
        }
    }

    writeln!(out, "\nIssue counts:")?;
    for (kind, count) in &summary.issue_counts {
        writeln!(out, "  {:<20} {}", kind.as_str(), count)?;
    }
    Ok(())
}
