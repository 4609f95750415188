//! Grouped value sampling for PostgreSQL.

use crate::Result;
use crate::adapters::{ValueCount, quote_identifier};
use crate::error::{DbAnnotateError, classify_sqlx_error};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};

/// Builds the grouped sampling statement.
///
/// Values are returned as `jsonb` so every column type decodes the same way.
/// Groups with equal counts are ordered by their JSON text so repeated runs
/// keep the same groups in the same order. Types without an equality
/// operator (`json`, `xml`) make the statement fail, which the caller treats
/// as a skipped column.
pub fn sample_query(schema: &str, table: &str, column: &str) -> String {
    format!(
        "SELECT to_jsonb(g.v) AS v, g.n FROM (\
         SELECT s.v, COUNT(*) AS n FROM (SELECT {} AS v FROM {}.{} LIMIT $1) s \
         GROUP BY s.v ORDER BY n DESC, to_jsonb(s.v)::text LIMIT $2) g \
         ORDER BY g.n DESC, to_jsonb(g.v)::text",
        quote_identifier(column),
        quote_identifier(schema),
        quote_identifier(table)
    )
}

pub(crate) async fn sample_value_counts(
    pool: &PgPool,
    schema: &str,
    table: &str,
    column: &str,
    row_limit: u64,
    distinct_cap: u64,
) -> Result<Vec<ValueCount>> {
    let query = sample_query(schema, table, column);
    let rows = sqlx::query(&query)
        .bind(i64::try_from(row_limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(distinct_cap).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) => DbAnnotateError::query_failed(format!(
                "Sampling {}.{} failed: {}",
                table,
                column,
                db.message()
            )),
            other => classify_sqlx_error(format!("Failed to sample {}.{}", table, column), other),
        })?;

    Ok(rows
        .iter()
        .map(|row| {
            let value: Option<JsonValue> = row.try_get("v").unwrap_or_default();
            let count: i64 = row.try_get("n").unwrap_or(0);
            ValueCount {
                value: value.unwrap_or(JsonValue::Null),
                count: u64::try_from(count).unwrap_or(0),
            }
        })
        .collect())
}
