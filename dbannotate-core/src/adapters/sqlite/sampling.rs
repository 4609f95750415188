//! Grouped value sampling for SQLite.

use crate::Result;
use crate::adapters::{ValueCount, quote_identifier};
use crate::error::{DbAnnotateError, classify_sqlx_error};
use serde_json::Value as JsonValue;
use sqlx::{Row, SqlitePool};

/// Builds the grouped sampling statement.
///
/// The inner `LIMIT` bounds the rows read; the outer one bounds the groups
/// returned. Groups come back most frequent first.
pub fn sample_query(table: &str, column: &str) -> String {
    format!(
        "SELECT v, COUNT(*) AS n FROM (SELECT {} AS v FROM {} LIMIT ?1) GROUP BY v ORDER BY n DESC, v LIMIT ?2",
        quote_identifier(column),
        quote_identifier(table)
    )
}

pub(crate) async fn sample_value_counts(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    row_limit: u64,
    distinct_cap: u64,
) -> Result<Vec<ValueCount>> {
    let query = sample_query(table, column);
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
            let count: i64 = row.try_get("n").unwrap_or(0);
            ValueCount {
                value: extract_value(row),
                count: u64::try_from(count).unwrap_or(0),
            }
        })
        .collect())
}

/// Reads the dynamically typed `v` column as JSON.
fn extract_value(row: &sqlx::sqlite::SqliteRow) -> JsonValue {
    if let Ok(v) = row.try_get::<Option<String>, _>("v") {
        return v.map_or(JsonValue::Null, JsonValue::String);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>("v") {
        return v.map_or(JsonValue::Null, |n| JsonValue::Number(n.into()));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>("v") {
        return v
            .and_then(serde_json::Number::from_f64)
            .map_or(JsonValue::Null, JsonValue::Number);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>("v") {
        return v.map_or(JsonValue::Null, |bytes| {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            JsonValue::String(format!("base64:{}", encoded))
        });
    }
    JsonValue::Null
}
