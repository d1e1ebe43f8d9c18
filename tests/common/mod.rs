//! Shared infrastructure for the database integration tests
//!
//! Every test truncates the same schema, so tests hold a process-wide lock
//! for as long as their `TestDb` lives.

#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgConnection;
use tokio::sync::{Mutex, MutexGuard};

use projectpulse_seed::schema::Table;
use projectpulse_seed::{Database, FakeData, Seeder};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub struct TestDb {
    db: Database,
    _guard: MutexGuard<'static, ()>,
}

impl TestDb {
    /// Connect to `TEST_DATABASE_URL` (or `DATABASE_URL`) and provision the fixture schema
    pub async fn new() -> Result<Self> {
        let guard = DB_LOCK.lock().await;

        let url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "postgresql://localhost/projectpulse_test".into());

        let mut db = Database::connect_url(&url).await?;
        sqlx::raw_sql(SCHEMA_SQL).execute(db.connection()).await?;

        Ok(Self { db, _guard: guard })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        self.db.connection()
    }

    pub fn database(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Seeder with a fixed seed and anchor
    pub fn seeder(&mut self, seed: u64) -> Seeder<'_> {
        Seeder::new(self.db.connection(), fake(seed))
    }

    pub async fn count(&mut self, table: Table) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.qualified());
        Ok(sqlx::query_scalar(&sql).fetch_one(self.conn()).await?)
    }

    pub async fn close(self) -> Result<()> {
        self.db.close().await?;
        Ok(())
    }
}

pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid anchor")
}

pub fn fake(seed: u64) -> FakeData {
    FakeData::from_seed(seed).with_anchor(anchor())
}
