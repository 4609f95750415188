//! End-to-end analysis runs against in-memory fixtures.
//!
//! This test suite covers:
//! - Statistics eligibility boundaries
//! - Missing-constraint inference with and without declared keys
//! - Duplicate detection and inheritance suppression
//! - Namespace grouping
//! - Repeatability and skip-and-warn recovery

use dbannotate_core::{
    AnalysisConfig, InferenceMode, Result, SchemaAnalyzer, SizeMetrics,
    adapters::{MemoryProvider, ProviderFeature, RawColumn, ValueCount},
    analysis::{ColumnIssue, DuplicateKind, IssueKind, MissingConstraint, TableIssue},
    models::ForeignKeyEdge,
};

fn rows(count: u64) -> SizeMetrics {
    SizeMetrics::new(8192, 16384, count)
}

/// A small shop schema exercising every analyzer.
fn shop() -> MemoryProvider {
    MemoryProvider::new()
        .with_column("users", RawColumn::new("id", "integer").with_nullable(false))
        .with_column("users", RawColumn::new("status", "varchar(16)"))
        .with_column("users", RawColumn::new("is_admin", "boolean"))
        .with_column("users", RawColumn::new("mood", "mood").with_enum())
        .with_primary_key("users", &["id"])
        .with_size("users", rows(5000))
        .with_value_counts(
            "users",
            "status",
            vec![ValueCount::new("active", 998), ValueCount::new("inactive", 2)],
        )
        .with_value_counts(
            "users",
            "is_admin",
            vec![ValueCount::new(false, 990), ValueCount::new(true, 10)],
        )
        .with_value_counts(
            "users",
            "mood",
            vec![ValueCount::new("happy", 500), ValueCount::new("sad", 300), ValueCount::new("ok", 200)],
        )
        .with_column("orders", RawColumn::new("id", "integer"))
        .with_column("orders", RawColumn::new("user_id", "integer"))
        .with_column("orders", RawColumn::new("channel", "text"))
        .with_primary_key("orders", &["id"])
        .with_size("orders", rows(10))
        .with_value_counts(
            "orders",
            "channel",
            vec![ValueCount::new("web", 6), ValueCount::new("shop", 3), ValueCount::new("app", 1)],
        )
        .with_column("payments", RawColumn::new("id", "integer"))
        .with_column("payments", RawColumn::new("order_id", "integer"))
        .with_primary_key("payments", &["id"])
        .with_foreign_key(ForeignKeyEdge::new("payments", "order_id", "orders", "id"))
        .with_size("payments", rows(9))
        .with_value_counts("payments", "order_id", vec![ValueCount::new(1, 9)])
        .with_column("blog_post", RawColumn::new("id", "integer"))
        .with_column("blog_post", RawColumn::new("title", "text"))
        .with_column("blog_post", RawColumn::new("body", "text"))
        .with_primary_key("blog_post", &["id"])
        .with_size("blog_post", rows(0))
        .with_column("blog_comment", RawColumn::new("id", "integer"))
        .with_column("blog_comment", RawColumn::new("post_id", "integer"))
        .with_primary_key("blog_comment", &["id"])
        .with_size("blog_comment", rows(0))
        .with_column("forum_thread", RawColumn::new("id", "integer"))
        .with_primary_key("forum_thread", &["id"])
        .with_size("forum_thread", rows(100))
        .with_column("person", RawColumn::new("id", "integer"))
        .with_column("person", RawColumn::new("name", "text"))
        .with_column("person", RawColumn::new("email", "text"))
        .with_size("person", rows(100))
        .with_column("employee", RawColumn::new("id", "integer"))
        .with_column("employee", RawColumn::new("name", "text"))
        .with_column("employee", RawColumn::new("email", "text"))
        .with_size("employee", rows(100))
        .with_inheritance("person", "employee")
        .with_column("contact", RawColumn::new("email", "text"))
        .with_column("contact", RawColumn::new("name", "text"))
        .with_column("contact", RawColumn::new("id", "integer"))
        .with_size("contact", rows(100))
}

#[tokio::test]
async fn test_integration_small_tables_are_not_sampled() -> Result<()> {
    let report = SchemaAnalyzer::with_defaults().run(&shop()).await?;

    // Nine rows: below the sampling threshold, constant sample ignored
    let payments = report.table("payments").unwrap();
    assert!(payments.columns.iter().all(|c| c.issues.is_empty()));
    assert_eq!(payments.issues, vec![TableIssue::TooSmall { rows: 9 }]);

    // Exactly ten rows: sampled, but never low-cardinality
    let orders = report.table("orders").unwrap();
    assert!(orders.columns.iter().all(|c| c.issues.is_empty()));
    assert!(orders.issues.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_integration_ten_row_table_gets_constant_issue() -> Result<()> {
    let provider = MemoryProvider::new()
        .with_column("flags", RawColumn::new("id", "integer"))
        .with_column("flags", RawColumn::new("flag", "text"))
        .with_primary_key("flags", &["id"])
        .with_size("flags", rows(10))
        .with_value_counts("flags", "flag", vec![ValueCount::new("x", 10)]);

    let report = SchemaAnalyzer::with_defaults().run(&provider).await?;
    let flag = report.table("flags").unwrap().column("flag").unwrap();
    assert_eq!(flag.messages, vec!["value is always \"x\"".to_string()]);
    assert!(matches!(flag.issues.as_slice(), [ColumnIssue::Constant { .. }]));
    Ok(())
}

#[tokio::test]
async fn test_integration_column_statistics() -> Result<()> {
    let report = SchemaAnalyzer::with_defaults().run(&shop()).await?;
    let users = report.table("users").unwrap();

    assert_eq!(
        users.column("status").unwrap().messages,
        vec!["value is always \"active\" or \"inactive\"".to_string()]
    );
    // A declared boolean is never pseudo-boolean but still has few values
    assert_eq!(
        users.column("is_admin").unwrap().issues,
        vec![ColumnIssue::LowCardinality { threshold: 10 }]
    );
    // Enumerations are expected to have few values
    assert!(users.column("mood").unwrap().issues.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_integration_missing_constraints() -> Result<()> {
    let report = SchemaAnalyzer::with_defaults().run(&shop()).await?;

    assert!(
        report
            .missing_constraints
            .contains(&MissingConstraint::new("orders", "user_id", "users"))
    );
    assert!(
        report
            .missing_constraints
            .contains(&MissingConstraint::new("blog_comment", "post_id", "blog_post"))
    );
    // Declared key, not inferred again
    assert!(
        !report
            .missing_constraints
            .iter()
            .any(|m| m.source.table == "payments")
    );
    assert_eq!(report.foreign_keys.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_integration_duplicates_respect_inheritance() -> Result<()> {
    let report = SchemaAnalyzer::with_defaults().run(&shop()).await?;

    assert!(!report.duplicates.iter().any(|d| d.pairs("person", "employee")));
    let contact = report
        .duplicates
        .iter()
        .find(|d| d.pairs("person", "contact"))
        .unwrap();
    assert_eq!(contact.kinds, vec![DuplicateKind::SameColumns]);

    // Inheritance participants count as keyed
    assert!(report.table("person").unwrap().issues.is_empty());
    assert_eq!(report.table("contact").unwrap().issues, vec![TableIssue::NoKey]);
    Ok(())
}

#[tokio::test]
async fn test_integration_namespaces() -> Result<()> {
    let report = SchemaAnalyzer::with_defaults().run(&shop()).await?;

    assert_eq!(
        report.namespaces.members("blog"),
        Some(&["blog_post".to_string(), "blog_comment".to_string()][..])
    );
    assert_eq!(report.namespaces.members("forum"), None);
    assert_eq!(
        report.table("blog_comment").unwrap().namespace.as_deref(),
        Some("blog")
    );
    assert_eq!(report.table("blog_post").unwrap().issues, vec![TableIssue::Empty]);
    Ok(())
}

#[tokio::test]
async fn test_integration_runs_are_repeatable() -> Result<()> {
    let provider = shop();
    let analyzer = SchemaAnalyzer::new(AnalysisConfig::default().with_max_concurrency(8))?;

    let snapshot = analyzer.build(&provider).await?;
    let first = analyzer.analyze(&provider, &snapshot).await?;
    let second = analyzer.analyze(&provider, &snapshot).await?;
    assert_eq!(first, second);

    let sequential = SchemaAnalyzer::new(AnalysisConfig::default().with_max_concurrency(1))?;
    let third = sequential.analyze(&provider, &snapshot).await?;
    assert_eq!(first, third);
    Ok(())
}

#[tokio::test]
async fn test_integration_failures_degrade_to_warnings() -> Result<()> {
    let provider = shop()
        .with_failing_sample("users", "status")
        .with_column("users", RawColumn::new("location", "geography"));
    let report = SchemaAnalyzer::with_defaults().run(&provider).await?;

    let users = report.table("users").unwrap();
    assert!(users.column("status").unwrap().issues.is_empty());
    assert!(users.column("location").is_none());
    assert!(report.warnings.iter().any(|w| w.contains("users.location")));
    assert!(report.warnings.iter().any(|w| w.contains("users.status")));
    Ok(())
}

#[tokio::test]
async fn test_integration_connection_loss_is_fatal() {
    let provider = shop().with_connection_loss("contact");
    let error = SchemaAnalyzer::with_defaults().run(&provider).await.unwrap_err();
    assert!(error.is_fatal());
}

#[tokio::test]
async fn test_integration_all_matches_and_capabilities() -> Result<()> {
    let provider = shop()
        .with_column("user", RawColumn::new("id", "integer"))
        .with_features(&[ProviderFeature::TableSizes]);
    let config = AnalysisConfig::default().with_inference_mode(InferenceMode::AllMatches);
    let report = SchemaAnalyzer::new(config)?.run(&provider).await?;

    let targets: Vec<&str> = report
        .missing_constraints
        .iter()
        .filter(|m| m.source.table == "orders" && m.source.column == "user_id")
        .map(|m| m.target_table.as_str())
        .collect();
    assert_eq!(targets, vec!["users", "user"]);

    // Without inheritance support person/employee become candidates
    assert!(report.duplicates.iter().any(|d| d.pairs("person", "employee")));

    // Without sampling support no column issues at all
    let summary = report.summary();
    assert_eq!(summary.issue_counts[&IssueKind::PseudoBoolean], 0);
    assert!(
        !report
            .tables
            .iter()
            .flat_map(|t| t.columns.iter())
            .any(|c| c.issues.iter().any(|i| matches!(i, ColumnIssue::Constant { .. })))
    );
    Ok(())
}
