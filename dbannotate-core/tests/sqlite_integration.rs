//! SQLite end-to-end analysis tests.
//!
//! This test suite covers:
//! - Catalog introspection feeding the analyzers
//! - Grouped value sampling on real rows
//! - Read-only file databases opened through `create_provider`
//!
//! Note: SQLite tests use in-memory or temporary databases, so no containers needed.

#![cfg(feature = "sqlite")]

use dbannotate_core::{
    Result, SchemaAnalyzer,
    adapters::{create_provider, sqlite::SqliteProvider},
    analysis::{ColumnIssue, DuplicateKind, MissingConstraint, TableIssue},
    models::{DatabaseType, ForeignKeyEdge},
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        email TEXT UNIQUE,
        status TEXT NOT NULL,
        region TEXT
    )",
    "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, amount REAL)",
    "CREATE TABLE invoice (
        id INTEGER PRIMARY KEY,
        order_id INTEGER REFERENCES orders(id),
        total REAL
    )",
    "CREATE TABLE audit_log (message TEXT, created_at TEXT)",
    "CREATE TABLE audit_archive (message TEXT, created_at TEXT)",
    "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 50)
     INSERT INTO users (id, email, status, region)
     SELECT n, 'user' || n || '@example.com',
            CASE WHEN n <= 2 THEN 'inactive' ELSE 'active' END, 'eu'
     FROM seq",
];

async fn populate(pool: &SqlitePool) {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.unwrap();
    }
}

/// In-memory databases live on one connection, so the provider wraps the
/// pool that created the schema.
async fn memory_provider() -> SqliteProvider {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    populate(&pool).await;
    SqliteProvider::from_pool(pool)
}

#[tokio::test]
async fn test_sqlite_snapshot_from_catalog() -> Result<()> {
    let provider = memory_provider().await;
    let snapshot = SchemaAnalyzer::with_defaults().build(&provider).await?;

    assert_eq!(snapshot.database_type, DatabaseType::SQLite);
    let names: Vec<&str> = snapshot.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["audit_archive", "audit_log", "invoice", "orders", "users"]
    );

    let users = snapshot.table("users").unwrap();
    assert_eq!(users.primary_key, vec!["id"]);
    assert_eq!(users.size.row_count, 50);
    assert!(users.column("email").unwrap().unique);
    assert!(!users.column("status").unwrap().nullable);

    let invoice = snapshot.table("invoice").unwrap();
    assert_eq!(
        invoice.foreign_keys,
        vec![ForeignKeyEdge::new("invoice", "order_id", "orders", "id")]
    );
    Ok(())
}

#[tokio::test]
async fn test_sqlite_full_analysis() -> Result<()> {
    let provider = memory_provider().await;
    let report = SchemaAnalyzer::with_defaults().run(&provider).await?;

    let users = report.table("users").unwrap();
    assert_eq!(
        users.column("status").unwrap().messages,
        vec!["value is always \"active\" or \"inactive\"".to_string()]
    );
    assert_eq!(
        users.column("region").unwrap().issues,
        vec![ColumnIssue::Constant {
            value: serde_json::json!("eu")
        }]
    );
    assert!(users.column("email").unwrap().issues.is_empty());
    assert!(users.column("id").unwrap().issues.is_empty());

    assert_eq!(
        report.missing_constraints,
        vec![MissingConstraint::new("orders", "user_id", "users")]
    );

    let audit = report
        .duplicates
        .iter()
        .find(|d| d.pairs("audit_log", "audit_archive"))
        .unwrap();
    assert_eq!(audit.kinds, vec![DuplicateKind::SameColumns]);
    assert_eq!(
        report.namespaces.members("audit"),
        Some(&["audit_archive".to_string(), "audit_log".to_string()][..])
    );

    assert_eq!(
        report.table("audit_log").unwrap().issues,
        vec![TableIssue::Empty, TableIssue::NoKey]
    );
    assert_eq!(report.table("orders").unwrap().issues, vec![TableIssue::Empty]);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_file_database_is_read_only() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let pool = SqlitePool::connect(&url).await.unwrap();
    populate(&pool).await;
    pool.close().await;

    let path = path.to_string_lossy().to_string();
    let provider = create_provider(&path).await?;
    assert_eq!(provider.database_type(), DatabaseType::SQLite);

    let report = SchemaAnalyzer::with_defaults().run(provider.as_ref()).await?;
    assert_eq!(report.tables.len(), 5);
    assert_eq!(report.summary().total_rows, 50);

    let direct = SqliteProvider::new(&path).await?;
    let write = sqlx::query("INSERT INTO orders (user_id, amount) VALUES (1, 9.5)")
        .execute(&direct.pool)
        .await;
    assert!(write.is_err(), "file databases must be opened read-only");
    direct.close().await;
    Ok(())
}
