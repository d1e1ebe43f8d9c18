//! Seeding pipeline integration tests
//!
//! Run with: cargo test --test seed_pipeline -- --ignored
//! Requires TEST_DATABASE_URL (or DATABASE_URL) pointing at a scratch database.

mod common;

use anyhow::Result;

use common::TestDb;
use projectpulse_seed::pipeline::{self, Stage};
use projectpulse_seed::schema;
use projectpulse_seed::seed::reference::CATALOGS;
use projectpulse_seed::seed::reset;
use projectpulse_seed::{SeedCounts, SeedError, Verifier};

// =========================================================================
// RESET
// =========================================================================

#[tokio::test]
#[ignore] // Requires database
async fn test_reset_twice_leaves_every_table_empty() -> Result<()> {
    let mut db = TestDb::new().await?;
    pipeline::run(&mut db.seeder(1), &SeedCounts::default()).await?;

    for _ in 0..2 {
        let cleared = db.seeder(1).reset().await?;
        assert_eq!(cleared, schema::ALL_TABLES.len());

        for table in schema::ALL_TABLES {
            assert_eq!(db.count(table).await?, 0, "{table} not empty after reset");
        }
    }

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_reset_over_bare_connection_clears_every_table() -> Result<()> {
    let mut db = TestDb::new().await?;
    pipeline::run(&mut db.seeder(8), &SeedCounts::default()).await?;

    let cleared = reset::reset_all(db.conn()).await?;
    assert_eq!(cleared, schema::ALL_TABLES.len());
    for table in schema::ALL_TABLES {
        assert_eq!(db.count(table).await?, 0, "{table} not empty after reset");
    }

    db.close().await
}

// =========================================================================
// END-TO-END SCENARIOS
// =========================================================================

#[tokio::test]
#[ignore] // Requires database
async fn test_seed_five_users() -> Result<()> {
    let mut db = TestDb::new().await?;
    let mut seeder = db.seeder(2);
    seeder.reset().await?;
    let inserted = seeder.seed_users(5).await?;

    assert_eq!(inserted, 5);
    assert_eq!(db.count(schema::USERS).await?, 5);

    let hashes: Vec<String> = sqlx::query_scalar("SELECT password_hash FROM users.users")
        .fetch_all(db.conn())
        .await?;
    assert!(hashes
        .iter()
        .all(|h| h.len() == 64 && h.chars().all(|c| c.is_ascii_hexdigit())));

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_projects_resolve_reference_and_owner_rows() -> Result<()> {
    let mut db = TestDb::new().await?;
    let mut seeder = db.seeder(3);
    seeder.reset().await?;
    seeder.seed_reference().await?;
    seeder.seed_users(4).await?;
    seeder.seed_projects(3).await?;

    let resolved: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM projects.projects p
        JOIN reference.phase_reference ph ON ph.phase_id = p.phase_id
        JOIN reference.license_reference l ON l.license_id = p.license_id
        JOIN reference.priority_reference pr ON pr.priority_id = p.priority_id
        JOIN users.users u ON u.user_id = p.owner_id
        "#,
    )
    .fetch_one(db.conn())
    .await?;
    assert_eq!(resolved, 3);

    let report = Verifier::run_for_table(db.conn(), schema::PROJECTS).await;
    assert!(report.is_clean(), "{:?}", report.failed);

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_decision_logs_reference_seeded_documents() -> Result<()> {
    let mut db = TestDb::new().await?;
    let mut seeder = db.seeder(4);
    seeder.reset().await?;
    seeder.seed_reference().await?;
    seeder.seed_users(5).await?;
    seeder.seed_projects(3).await?;
    assert_eq!(seeder.seed_documents(5).await?, 5);
    seeder.seed_decision_logs(10).await?;

    let unresolved: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM projects.project_decision_log d
        LEFT JOIN documents.documents doc ON doc.document_id = d.related_document_id
        WHERE doc.document_id IS NULL
        "#,
    )
    .fetch_one(db.conn())
    .await?;
    assert_eq!(unresolved, 0, "decision logs must point at seeded documents");
    assert_eq!(db.count(schema::DECISION_LOG).await?, 10);

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_sessions_without_users_fail_fast() -> Result<()> {
    let mut db = TestDb::new().await?;
    let mut seeder = db.seeder(5);
    seeder.reset().await?;

    let err = seeder.seed_sessions(5).await.unwrap_err();
    assert!(err.is_empty_dependency(), "unexpected error: {err}");
    assert!(matches!(err, SeedError::EmptyDependency { ref table } if table == "users.users"));
    assert_eq!(db.count(schema::SESSIONS).await?, 0);

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_document_history_is_empty_without_documents() -> Result<()> {
    let mut db = TestDb::new().await?;
    let mut seeder = db.seeder(6);
    seeder.reset().await?;
    seeder.seed_reference().await?;
    seeder.seed_users(2).await?;

    assert_eq!(seeder.seed_document_history().await?, 0);
    assert_eq!(db.count(schema::DOCUMENT_HISTORY).await?, 0);

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_document_history_without_documents_or_users_is_empty() -> Result<()> {
    let mut db = TestDb::new().await?;
    let mut seeder = db.seeder(9);
    seeder.reset().await?;

    assert_eq!(seeder.seed_document_history().await?, 0);
    assert_eq!(db.count(schema::USERS).await?, 0);
    assert_eq!(db.count(schema::DOCUMENT_HISTORY).await?, 0);

    db.close().await
}

// =========================================================================
// FULL RUN
// =========================================================================

#[tokio::test]
#[ignore] // Requires database
async fn test_full_run_passes_verification() -> Result<()> {
    let mut db = TestDb::new().await?;
    let counts = SeedCounts::default();
    let summary = pipeline::run(&mut db.seeder(7), &counts).await?;

    assert_eq!(summary.stages.len(), Stage::ALL.len());
    assert_eq!(summary.rows_for(Stage::Users), Some(10));
    assert_eq!(summary.rows_for(Stage::ProjectLinks), Some(150));
    assert_eq!(db.count(schema::SESSIONS).await?, 20);
    assert_eq!(db.count(schema::PROJECTS).await?, 30);
    assert_eq!(db.count(schema::DOCUMENTS).await?, 50);
    assert_eq!(db.count(schema::DECISION_LOG).await?, 30);
    assert_eq!(db.count(schema::PROJECT_HISTORY).await?, 50);
    // one snapshot per document
    assert_eq!(db.count(schema::DOCUMENT_HISTORY).await?, 50);

    let report = Verifier::new().run(db.conn()).await;
    assert!(report.is_clean(), "failed checks: {:#?}", report.failed);

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_same_seed_reproduces_rows() -> Result<()> {
    let mut db = TestDb::new().await?;
    let counts = SeedCounts::default();

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        pipeline::run(&mut db.seeder(99), &counts).await?;
        let rows: Vec<(i32, String, i32)> = sqlx::query_as(
            "SELECT project_id, title, owner_id FROM projects.projects ORDER BY project_id",
        )
        .fetch_all(db.conn())
        .await?;
        snapshots.push(rows);
    }

    assert_eq!(snapshots[0], snapshots[1]);

    db.close().await
}

#[tokio::test]
#[ignore] // Requires database
async fn test_failed_stage_keeps_earlier_stages() -> Result<()> {
    let mut db = TestDb::new().await?;
    let counts = SeedCounts {
        users: 0,
        ..SeedCounts::default()
    };

    let err = pipeline::run(&mut db.seeder(8), &counts).await.unwrap_err();
    assert!(matches!(err, SeedError::Stage { stage: Stage::Sessions, .. }));
    assert!(err.root().is_empty_dependency());

    let catalog_rows: usize = CATALOGS.iter().map(|c| c.rows.len()).sum();
    let reference_rows = {
        let mut total = 0;
        for table in schema::REFERENCE_TABLES {
            total += db.count(table).await?;
        }
        total
    };
    assert_eq!(reference_rows as usize, catalog_rows);
    assert_eq!(db.count(schema::SESSIONS).await?, 0);
    assert_eq!(db.count(schema::PROJECTS).await?, 0);

    db.close().await
}
