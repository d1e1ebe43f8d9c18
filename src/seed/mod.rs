//! Seeders for every table of the schema contract
//!
//! Each step reads the identifiers it depends on, generates rows from the
//! run's [`FakeData`], bulk-inserts them and commits, all inside one
//! transaction. A failing step is rolled back when its transaction is dropped.
//!
//! Foreign keys are drawn from id sets read inside the same transaction just
//! before generation. This is only race-free because a seeding run is the
//! sole writer: no concurrent writers may touch the schema during a run.

use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::{Connection, PgConnection};
use tracing::{debug, info};

use crate::database::insert_rows;
use crate::error::{Result, SeedError};
use crate::fake::FakeData;
use crate::schema::{self, Table};

pub mod documents;
pub mod history;
pub mod projects;
pub mod reference;
pub mod reset;
pub mod users;

// ============================================================================
// Dependency id sets
// ============================================================================

/// Identifiers currently present in a parent table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPool {
    table: Table,
    ids: Vec<i32>,
}

impl IdPool {
    pub fn new(table: Table, ids: Vec<i32>) -> Self {
        Self { table, ids }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Fail with [`SeedError::EmptyDependency`] when the set is empty
    pub fn require(self) -> Result<Self> {
        if self.ids.is_empty() {
            return Err(SeedError::EmptyDependency {
                table: self.table.qualified(),
            });
        }
        Ok(self)
    }

    /// Uniform choice for a NOT NULL foreign key
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<i32> {
        self.ids
            .choose(rng)
            .copied()
            .ok_or_else(|| SeedError::EmptyDependency {
                table: self.table.qualified(),
            })
    }

    /// Uniform choice for a nullable foreign key; `None` when the set is empty
    pub fn pick_optional<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<i32> {
        self.ids.choose(rng).copied()
    }
}

/// Read every primary key of `table`, in key order
pub async fn fetch_ids(conn: &mut PgConnection, table: Table) -> Result<IdPool> {
    let sql = format!(
        "SELECT {key} FROM {table} ORDER BY {key}",
        key = table.key,
        table = table.qualified()
    );
    let ids: Vec<i32> = sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?;
    debug!("Fetched {} ids from {}", ids.len(), table);
    Ok(IdPool::new(table, ids))
}

/// Like [`fetch_ids`], failing fast when the table is empty
pub async fn fetch_required(conn: &mut PgConnection, table: Table) -> Result<IdPool> {
    fetch_ids(conn, table).await?.require()
}

// ============================================================================
// Seeder
// ============================================================================

/// Runs seeding steps over one open connection
pub struct Seeder<'c> {
    conn: &'c mut PgConnection,
    fake: FakeData,
}

impl<'c> Seeder<'c> {
    pub fn new(conn: &'c mut PgConnection, fake: FakeData) -> Self {
        Self { conn, fake }
    }

    pub fn fake(&mut self) -> &mut FakeData {
        &mut self.fake
    }

    /// Remove all rows from every table of the contract
    pub async fn reset(&mut self) -> Result<usize> {
        reset::reset_all(&mut *self.conn).await
    }

    /// Insert the fixed enumeration rows
    pub async fn seed_reference(&mut self) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let inserted = reference::insert_catalogs(&mut tx).await?;
        tx.commit().await?;
        info!("Seeded {} reference rows", inserted);
        Ok(inserted)
    }

    pub async fn seed_users(&mut self, count: usize) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let rows = users::generate_users(&mut self.fake, count);
        let inserted = insert_rows(&mut tx, rows).await?;
        tx.commit().await?;
        log_seeded(inserted, schema::USERS);
        Ok(inserted)
    }

    pub async fn seed_sessions(&mut self, count: usize) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let user_ids = fetch_required(&mut tx, schema::USERS).await?;
        let rows = users::generate_sessions(&mut self.fake, &user_ids, count)?;
        let inserted = insert_rows(&mut tx, rows).await?;
        tx.commit().await?;
        log_seeded(inserted, schema::SESSIONS);
        Ok(inserted)
    }

    pub async fn seed_projects(&mut self, count: usize) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let deps = projects::ProjectDependencies::fetch(&mut tx).await?;
        let rows = projects::generate_projects(&mut self.fake, &deps, count)?;
        let inserted = insert_rows(&mut tx, rows).await?;
        tx.commit().await?;
        log_seeded(inserted, schema::PROJECTS);
        Ok(inserted)
    }

    /// Fill the three project join tables with `count` rows each
    pub async fn seed_project_links(&mut self, count: usize) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let project_ids = fetch_required(&mut tx, schema::PROJECTS).await?;
        let feature_ids = fetch_required(&mut tx, schema::FEATURE).await?;
        let tech_ids = fetch_required(&mut tx, schema::TECH_STACK).await?;
        let tag_ids = fetch_required(&mut tx, schema::TAG).await?;

        let fake = &mut self.fake;
        let feature_links = projects::generate_links(fake, &project_ids, &feature_ids, count)?;
        let tech_links = projects::generate_links(fake, &project_ids, &tech_ids, count)?;
        let tag_links = projects::generate_links(fake, &project_ids, &tag_ids, count)?;

        let mut inserted = 0;
        inserted += insert_rows(&mut tx, projects::feature_rows(feature_links)).await?;
        inserted += insert_rows(&mut tx, projects::tech_rows(tech_links)).await?;
        inserted += insert_rows(&mut tx, projects::tag_rows(tag_links)).await?;
        tx.commit().await?;

        info!("Seeded {} project link rows", inserted);
        Ok(inserted)
    }

    pub async fn seed_documents(&mut self, count: usize) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let deps = documents::DocumentDependencies::fetch(&mut tx).await?;
        let rows = documents::generate_documents(&mut self.fake, &deps, count)?;
        let inserted = insert_rows(&mut tx, rows).await?;
        tx.commit().await?;
        log_seeded(inserted, schema::DOCUMENTS);
        Ok(inserted)
    }

    pub async fn seed_decision_logs(&mut self, count: usize) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let deps = projects::DecisionDependencies::fetch(&mut tx).await?;
        let rows = projects::generate_decisions(&mut self.fake, &deps, count)?;
        let inserted = insert_rows(&mut tx, rows).await?;
        tx.commit().await?;
        log_seeded(inserted, schema::DECISION_LOG);
        Ok(inserted)
    }

    pub async fn seed_project_history(&mut self, count: usize) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let deps = history::ProjectHistoryDependencies::fetch(&mut tx).await?;
        let rows = history::generate_project_history(&mut self.fake, &deps, count)?;
        let inserted = insert_rows(&mut tx, rows).await?;
        tx.commit().await?;
        log_seeded(inserted, schema::PROJECT_HISTORY);
        Ok(inserted)
    }

    /// One snapshot row per existing document
    pub async fn seed_document_history(&mut self) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let Some(deps) = history::DocumentHistoryDependencies::fetch(&mut tx).await? else {
            info!("No documents to snapshot into {}", schema::DOCUMENT_HISTORY);
            return Ok(0);
        };
        let rows = history::generate_document_history(&mut self.fake, &deps)?;
        let inserted = insert_rows(&mut tx, rows).await?;
        tx.commit().await?;
        log_seeded(inserted, schema::DOCUMENT_HISTORY);
        Ok(inserted)
    }
}

fn log_seeded(inserted: u64, table: Table) {
    info!("Seeded {} rows into {}", inserted, table);
}
