//! Append-only audit snapshots for projects and documents
//!
//! Rows describe a plausible prior state; they are not diffs computed
//! against the real history of the entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::types::Json;
use sqlx::PgConnection;

use super::documents::{MAX_SIZE, MIN_SIZE};
use super::projects::{Endpoints, Settings};
use super::{fetch_ids, fetch_required, IdPool};
use crate::database::Insertable;
use crate::error::Result;
use crate::fake::FakeData;
use crate::schema::{self, Table};

/// Fields a project change summary may name
pub const CHANGED_FIELDS: &[&str] = &["title", "description", "priority_id", "version"];

/// Project history versions, in hundredths: 0.10 ..= 1.50
pub const PROJECT_VERSION_RANGE: (i64, i64) = (10, 150);

/// Structured delta stored in `change_summary`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub field: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone)]
pub struct NewProjectHistory {
    pub project_id: i32,
    pub changed_at: DateTime<Utc>,
    pub changed_by: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub settings: Settings,
    pub endpoints: Endpoints,
    pub version: Decimal,
    pub priority_id: i32,
    pub image_url: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub change_summary: ChangeSummary,
}

impl Insertable for NewProjectHistory {
    const TABLE: Table = schema::PROJECT_HISTORY;
    const COLUMNS: &'static [&'static str] = &[
        "project_id",
        "changed_at",
        "changed_by",
        "owner_id",
        "title",
        "description",
        "settings",
        "endpoints",
        "version",
        "priority_id",
        "image_url",
        "deleted_at",
        "change_summary",
    ];

    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.project_id)
            .push_bind(self.changed_at)
            .push_bind(self.changed_by)
            .push_bind(self.owner_id)
            .push_bind(self.title)
            .push_bind(self.description)
            .push_bind(Json(self.settings))
            .push_bind(Json(self.endpoints))
            .push_bind(self.version)
            .push_bind(self.priority_id)
            .push_bind(self.image_url)
            .push_bind(self.deleted_at)
            .push_bind(Json(self.change_summary));
    }
}

#[derive(Debug, Clone)]
pub struct ProjectHistoryDependencies {
    pub projects: IdPool,
    pub users: IdPool,
    pub priorities: IdPool,
}

impl ProjectHistoryDependencies {
    pub async fn fetch(conn: &mut PgConnection) -> Result<Self> {
        Ok(Self {
            projects: fetch_required(conn, schema::PROJECTS).await?,
            users: fetch_required(conn, schema::USERS).await?,
            priorities: fetch_required(conn, schema::PRIORITY).await?,
        })
    }
}

pub fn generate_project_history(
    fake: &mut FakeData,
    deps: &ProjectHistoryDependencies,
    count: usize,
) -> Result<Vec<NewProjectHistory>> {
    let mut rows = Vec::with_capacity(count);
    let (low, high) = PROJECT_VERSION_RANGE;

    for _ in 0..count {
        let change_summary = ChangeSummary {
            field: fake.one_of(CHANGED_FIELDS).to_string(),
            old: fake.word().to_string(),
            new: fake.word().to_string(),
        };

        rows.push(NewProjectHistory {
            project_id: deps.projects.pick(fake.rng())?,
            changed_at: fake.date_time_within_days(30),
            changed_by: deps.users.pick(fake.rng())?,
            owner_id: deps.users.pick(fake.rng())?,
            title: fake.catch_phrase(),
            description: fake.text(100),
            settings: Settings {
                setting: fake.word().to_string(),
            },
            endpoints: Endpoints { api: fake.url() },
            version: fake.decimal_hundredths(low, high),
            priority_id: deps.priorities.pick(fake.rng())?,
            image_url: fake.image_url(),
            deleted_at: None,
            change_summary,
        });
    }

    Ok(rows)
}

#[derive(Debug, Clone)]
pub struct NewDocumentHistory {
    pub document_id: i32,
    pub changed_at: DateTime<Utc>,
    pub changed_by: i32,
    pub filename: String,
    pub size: i64,
    pub version: Decimal,
    pub priority_id: Option<i32>,
    pub phase_id: Option<i32>,
    pub filetype_id: Option<i32>,
    pub storage_id: Option<i32>,
}

impl Insertable for NewDocumentHistory {
    const TABLE: Table = schema::DOCUMENT_HISTORY;
    const COLUMNS: &'static [&'static str] = &[
        "document_id",
        "changed_at",
        "changed_by",
        "filename",
        "size",
        "version",
        "priority_id",
        "phase_id",
        "filetype_id",
        "storage_id",
    ];

    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.document_id)
            .push_bind(self.changed_at)
            .push_bind(self.changed_by)
            .push_bind(self.filename)
            .push_bind(self.size)
            .push_bind(self.version)
            .push_bind(self.priority_id)
            .push_bind(self.phase_id)
            .push_bind(self.filetype_id)
            .push_bind(self.storage_id);
    }
}

/// Documents to snapshot plus the ids their snapshot columns draw from
///
/// Only `users` is required; the reference columns are nullable.
#[derive(Debug, Clone)]
pub struct DocumentHistoryDependencies {
    pub documents: IdPool,
    pub users: IdPool,
    pub priorities: IdPool,
    pub phases: IdPool,
    pub filetypes: IdPool,
    pub storages: IdPool,
}

impl DocumentHistoryDependencies {
    /// `None` when there are no documents, before any other table is read
    pub async fn fetch(conn: &mut PgConnection) -> Result<Option<Self>> {
        let documents = fetch_ids(conn, schema::DOCUMENTS).await?;
        if documents.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            documents,
            users: fetch_required(conn, schema::USERS).await?,
            priorities: fetch_ids(conn, schema::PRIORITY).await?,
            phases: fetch_ids(conn, schema::PHASE).await?,
            filetypes: fetch_ids(conn, schema::FILETYPE).await?,
            storages: fetch_ids(conn, schema::STORAGE).await?,
        }))
    }
}

/// Exactly one snapshot per existing document
pub fn generate_document_history(
    fake: &mut FakeData,
    deps: &DocumentHistoryDependencies,
) -> Result<Vec<NewDocumentHistory>> {
    let mut rows = Vec::with_capacity(deps.documents.len());

    for &document_id in deps.documents.ids() {
        rows.push(NewDocumentHistory {
            document_id,
            changed_at: fake.anchor(),
            changed_by: deps.users.pick(fake.rng())?,
            filename: fake.file_name(),
            size: fake.int_between(MIN_SIZE, MAX_SIZE),
            version: Decimal::new(20, 2),
            priority_id: deps.priorities.pick_optional(fake.rng()),
            phase_id: deps.phases.pick_optional(fake.rng()),
            filetype_id: deps.filetypes.pick_optional(fake.rng()),
            storage_id: deps.storages.pick_optional(fake.rng()),
        });
    }

    Ok(rows)
}
