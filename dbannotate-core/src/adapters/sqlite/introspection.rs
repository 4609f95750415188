//! SQLite catalog queries.
//!
//! # SQLite System Tables
//! - `sqlite_master`: schema definitions for all database objects
//! - `pragma_table_info(t)`: columns, nullability, defaults, primary key positions
//! - `pragma_foreign_key_list(t)`: foreign key column pairs
//! - `pragma_index_list(t)` / `pragma_index_info(i)`: indexes and their columns
//! - `dbstat`: per-page storage (optional compile-time extension)

use crate::Result;
use crate::adapters::{RawColumn, parse_type_with_length, quote_identifier};
use crate::error::classify_sqlx_error;
use crate::models::{ForeignKeyEdge, SizeMetrics};
use sqlx::{Row, SqlitePool};

/// Lists user tables ordered by name.
pub(crate) async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| classify_sqlx_error("Failed to enumerate tables", e))?;

    rows.iter()
        .map(|row| {
            row.try_get::<String, _>("name")
                .map_err(|e| classify_sqlx_error("Failed to parse table name", e))
        })
        .collect()
}

pub(crate) async fn list_columns(pool: &SqlitePool, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| classify_sqlx_error(format!("Failed to collect columns for table '{}'", table), e))?;

    let unique_columns = unique_columns_or_empty(table, unique_columns(pool, table).await)?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row.try_get("name").unwrap_or_default();
        let type_name: String = row.try_get("type").unwrap_or_default();
        let not_null: i64 = row.try_get("notnull").unwrap_or(0);
        let pk: i64 = row.try_get("pk").unwrap_or(0);
        let default: Option<String> = row.try_get("dflt_value").unwrap_or_default();

        let (_, max_length) = parse_type_with_length(&type_name);
        let unique = unique_columns.contains(&name);

        columns.push(RawColumn {
            // Primary key columns are implicitly NOT NULL
            nullable: not_null == 0 && pk == 0,
            udt_name: None,
            max_length,
            default,
            unique,
            is_enum: false,
            type_name,
            name,
        });
    }

    Ok(columns)
}

/// Treats a failed unique-index lookup as "no unique columns".
///
/// A lost connection still aborts the column listing.
pub(crate) fn unique_columns_or_empty(
    table: &str,
    lookup: Result<Vec<String>>,
) -> Result<Vec<String>> {
    match lookup {
        Ok(columns) => Ok(columns),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!("Unique indexes of '{}' unavailable: {}", table, e);
            Ok(Vec::new())
        }
    }
}

/// Columns covered on their own by a unique index.
async fn unique_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT ii.name AS column_name
        FROM pragma_index_list(?1) AS il
        JOIN pragma_index_info(il.name) AS ii
        WHERE il."unique" = 1
        AND (SELECT COUNT(*) FROM pragma_index_info(il.name)) = 1
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        classify_sqlx_error(format!("Failed to collect unique indexes for table '{}'", table), e)
    })?;

    Ok(rows
        .iter()
        .filter_map(|row| row.try_get::<Option<String>, _>("column_name").ok().flatten())
        .collect())
}

/// Primary key columns in key order.
pub(crate) async fn primary_key(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            classify_sqlx_error(format!("Failed to collect primary key for table '{}'", table), e)
        })?;

    Ok(rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>("name").ok())
        .collect())
}

/// Foreign keys as one edge per column pair.
///
/// A reference without target columns points at the target's primary key.
pub(crate) async fn foreign_keys(pool: &SqlitePool, table: &str) -> Result<Vec<ForeignKeyEdge>> {
    let rows = sqlx::query(
        "SELECT \"table\", \"from\", \"to\", seq FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        classify_sqlx_error(format!("Failed to collect foreign keys for table '{}'", table), e)
    })?;

    let mut edges = Vec::with_capacity(rows.len());
    for row in &rows {
        let target_table: String = row.try_get("table").unwrap_or_default();
        let source_column: String = row.try_get("from").unwrap_or_default();
        let seq: i64 = row.try_get("seq").unwrap_or(0);
        let declared_target: Option<String> = row.try_get("to").unwrap_or_default();

        let target_column = match declared_target {
            Some(column) if !column.is_empty() => column,
            _ => {
                let target_pk = primary_key(pool, &target_table).await?;
                let position = usize::try_from(seq).unwrap_or(0);
                match target_pk.into_iter().nth(position) {
                    Some(column) => column,
                    None => {
                        tracing::debug!(
                            "Foreign key {}.{} references '{}' without a primary key",
                            table,
                            source_column,
                            target_table
                        );
                        continue;
                    }
                }
            }
        };

        edges.push(ForeignKeyEdge::new(
            table,
            source_column,
            target_table,
            target_column,
        ));
    }

    Ok(edges)
}

/// Names of columns appearing in any index, in index order, deduplicated.
pub(crate) async fn indexed_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT ii.name AS column_name
        FROM pragma_index_list(?1) AS il
        JOIN pragma_index_info(il.name) AS ii
        ORDER BY il.seq, ii.seqno
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| classify_sqlx_error(format!("Failed to collect indexes for table '{}'", table), e))?;

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        // Expression index entries have no column name
        if let Ok(Some(name)) = row.try_get::<Option<String>, _>("column_name")
            && !columns.contains(&name)
        {
            columns.push(name);
        }
    }
    Ok(columns)
}

/// Row count plus `dbstat` page sizes.
///
/// Byte counts are zero when `dbstat` is unavailable.
pub(crate) async fn table_size(pool: &SqlitePool, table: &str) -> Result<SizeMetrics> {
    let count_query = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
    let row_count: i64 = sqlx::query_scalar(&count_query)
        .fetch_one(pool)
        .await
        .map_err(|e| classify_sqlx_error(format!("Failed to count rows of table '{}'", table), e))?;

    let bytes = sqlx::query(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN s.name = ?1 THEN s.pgsize ELSE 0 END), 0) AS table_bytes,
            COALESCE(SUM(s.pgsize), 0) AS total_bytes
        FROM dbstat AS s
        JOIN sqlite_master AS m ON s.name = m.name
        WHERE m.tbl_name = ?1
        "#,
    )
    .bind(table)
    .fetch_one(pool)
    .await;

    let (bytes_no_index, bytes_total) = match bytes {
        Ok(row) => (
            row.try_get::<i64, _>("table_bytes").unwrap_or(0),
            row.try_get::<i64, _>("total_bytes").unwrap_or(0),
        ),
        Err(e) => {
            tracing::debug!("dbstat unavailable for '{}': {}", table, e);
            (0, 0)
        }
    };

    Ok(SizeMetrics::new(
        u64::try_from(bytes_no_index).unwrap_or(0),
        u64::try_from(bytes_total).unwrap_or(0),
        u64::try_from(row_count).unwrap_or(0),
    ))
}
