//! PostgreSQL catalog queries.
//!
//! Column facts come from `information_schema`; keys, indexes and
//! inheritance from `pg_catalog` where the standard views are too coarse.

use crate::Result;
use crate::adapters::{RawColumn, quote_identifier};
use crate::error::classify_sqlx_error;
use crate::models::{ForeignKeyEdge, InheritanceEdge, SizeMetrics};
use sqlx::{PgPool, Row};

pub(crate) async fn list_tables(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT table_name::text AS table_name
        FROM information_schema.tables
        WHERE table_schema = $1
        AND table_type = 'BASE TABLE'
        ORDER BY table_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|e| classify_sqlx_error("Failed to enumerate tables", e))?;

    rows.iter()
        .map(|row| {
            row.try_get::<String, _>("table_name")
                .map_err(|e| classify_sqlx_error("Failed to parse table name", e))
        })
        .collect()
}

pub(crate) async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query(
        r#"
        SELECT
            c.column_name::text AS column_name,
            c.data_type::text AS data_type,
            c.udt_name::text AS udt_name,
            c.character_maximum_length::integer AS max_length,
            c.is_nullable::text AS is_nullable,
            c.column_default::text AS column_default,
            COALESCE(t.typtype = 'e', false) AS is_enum,
            EXISTS (
                SELECT 1
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON kcu.constraint_name = tc.constraint_name
                    AND kcu.table_schema = tc.table_schema
                WHERE tc.constraint_type = 'UNIQUE'
                AND tc.table_schema = c.table_schema
                AND tc.table_name = c.table_name
                AND kcu.column_name = c.column_name
                AND (
                    SELECT COUNT(*)
                    FROM information_schema.key_column_usage k2
                    WHERE k2.constraint_name = tc.constraint_name
                    AND k2.table_schema = tc.table_schema
                ) = 1
            ) AS is_unique
        FROM information_schema.columns c
        LEFT JOIN pg_namespace tn ON tn.nspname = c.udt_schema
        LEFT JOIN pg_type t ON t.typname = c.udt_name AND t.typnamespace = tn.oid
        WHERE c.table_schema = $1
        AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        classify_sqlx_error(format!("Failed to collect columns for table '{}.{}'", schema, table), e)
    })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let max_length: Option<i32> = row.try_get("max_length").unwrap_or_default();
        let is_nullable: String = row.try_get("is_nullable").unwrap_or_default();

        columns.push(RawColumn {
            name: row.try_get("column_name").unwrap_or_default(),
            type_name: row.try_get("data_type").unwrap_or_default(),
            udt_name: row.try_get("udt_name").unwrap_or_default(),
            max_length: max_length.and_then(|l| u32::try_from(l).ok()),
            nullable: is_nullable == "YES",
            default: row.try_get("column_default").unwrap_or_default(),
            unique: row.try_get("is_unique").unwrap_or(false),
            is_enum: row.try_get("is_enum").unwrap_or(false),
        });
    }

    Ok(columns)
}

pub(crate) async fn primary_key(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT kcu.column_name::text AS column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        WHERE tc.constraint_type = 'PRIMARY KEY'
        AND tc.table_schema = $1
        AND tc.table_name = $2
        ORDER BY kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        classify_sqlx_error(
            format!("Failed to collect primary key for table '{}.{}'", schema, table),
            e,
        )
    })?;

    Ok(rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>("column_name").ok())
        .collect())
}

/// One edge per column pair, composite keys in key order.
pub(crate) async fn foreign_keys(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<ForeignKeyEdge>> {
    let rows = sqlx::query(
        r#"
        SELECT
            a.attname::text AS column_name,
            fcl.relname::text AS referenced_table,
            fa.attname::text AS referenced_column
        FROM pg_constraint con
        JOIN pg_class cl ON con.conrelid = cl.oid
        JOIN pg_namespace ns ON cl.relnamespace = ns.oid
        JOIN pg_class fcl ON con.confrelid = fcl.oid
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, fattnum, ord)
        JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
        JOIN pg_attribute fa ON fa.attrelid = con.confrelid AND fa.attnum = k.fattnum
        WHERE con.contype = 'f'
        AND ns.nspname = $1
        AND cl.relname = $2
        ORDER BY con.conname, k.ord
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        classify_sqlx_error(
            format!("Failed to collect foreign keys for table '{}.{}'", schema, table),
            e,
        )
    })?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let column: String = row.try_get("column_name").ok()?;
            let referenced_table: String = row.try_get("referenced_table").ok()?;
            let referenced_column: String = row.try_get("referenced_column").ok()?;
            Some(ForeignKeyEdge::new(
                table,
                column,
                referenced_table,
                referenced_column,
            ))
        })
        .collect())
}

pub(crate) async fn indexed_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT a.attname::text AS column_name
        FROM pg_index ix
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
        WHERE n.nspname = $1
        AND t.relname = $2
        ORDER BY i.relname, k.ord
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        classify_sqlx_error(format!("Failed to collect indexes for table '{}.{}'", schema, table), e)
    })?;

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        if let Ok(name) = row.try_get::<String, _>("column_name")
            && !columns.contains(&name)
        {
            columns.push(name);
        }
    }
    Ok(columns)
}

/// Exact row count plus relation sizes.
///
/// Relation sizes fall back to zero when the role may not read them.
pub(crate) async fn table_size(pool: &PgPool, schema: &str, table: &str) -> Result<SizeMetrics> {
    let count_query = format!(
        "SELECT COUNT(*) FROM {}.{}",
        quote_identifier(schema),
        quote_identifier(table)
    );
    let row_count: i64 = sqlx::query_scalar(&count_query)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            classify_sqlx_error(format!("Failed to count rows of table '{}.{}'", schema, table), e)
        })?;

    let sizes = sqlx::query(
        r#"
        SELECT
            pg_relation_size(c.oid) AS table_bytes,
            pg_total_relation_size(c.oid) AS total_bytes
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1
        AND c.relname = $2
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_optional(pool)
    .await;

    let (bytes_no_index, bytes_total) = match sizes {
        Ok(Some(row)) => (
            row.try_get::<i64, _>("table_bytes").unwrap_or(0),
            row.try_get::<i64, _>("total_bytes").unwrap_or(0),
        ),
        Ok(None) => (0, 0),
        Err(e) => {
            tracing::warn!("Size of '{}.{}' unavailable: {}", schema, table, e);
            (0, 0)
        }
    };

    Ok(SizeMetrics::new(
        u64::try_from(bytes_no_index).unwrap_or(0),
        u64::try_from(bytes_total).unwrap_or(0),
        u64::try_from(row_count).unwrap_or(0),
    ))
}

/// Parent/child pairs from `pg_inherits` where the child lives in `schema`.
pub(crate) async fn inherited_tables(pool: &PgPool, schema: &str) -> Result<Vec<InheritanceEdge>> {
    let rows = sqlx::query(
        r#"
        SELECT p.relname::text AS parent, c.relname::text AS child
        FROM pg_inherits i
        JOIN pg_class c ON c.oid = i.inhrelid
        JOIN pg_class p ON p.oid = i.inhparent
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1
        ORDER BY p.relname, c.relname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|e| classify_sqlx_error("Failed to collect table inheritance", e))?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let parent: String = row.try_get("parent").ok()?;
            let child: String = row.try_get("child").ok()?;
            Some(InheritanceEdge::new(parent, child))
        })
        .collect())
}
