//! Documents attached to projects

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::types::Json;
use sqlx::PgConnection;

use super::{fetch_required, IdPool};
use crate::database::Insertable;
use crate::error::Result;
use crate::fake::FakeData;
use crate::schema::{self, Table};

pub const SOURCES: &[&str] = &["internal", "external"];
pub const FORMATS: &[&str] = &["pdf", "docx", "txt"];

pub const MIN_SIZE: i64 = 1_000;
pub const MAX_SIZE: i64 = 1_000_000;

/// Share of documents generated soft-deleted
const SOFT_DELETE_RATIO: f64 = 0.1;

/// Free-form document properties JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProperties {
    pub reviewed: bool,
    pub tags: Vec<String>,
    pub source: String,
    pub format: String,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub project_id: i32,
    pub filename: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub filetype_id: i32,
    pub uploaded_by: String,
    pub storage_id: i32,
    pub image_url: String,
    pub version: Decimal,
    pub priority_id: i32,
    pub phase_id: i32,
    pub description: String,
    pub checksum: String,
    pub custom_properties: CustomProperties,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Insertable for NewDocument {
    const TABLE: Table = schema::DOCUMENTS;
    const COLUMNS: &'static [&'static str] = &[
        "project_id",
        "filename",
        "size",
        "uploaded_at",
        "filetype_id",
        "uploaded_by",
        "storage_id",
        "image_url",
        "version",
        "priority_id",
        "phase_id",
        "description",
        "checksum",
        "custom_properties",
        "deleted_at",
    ];

    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.project_id)
            .push_bind(self.filename)
            .push_bind(self.size)
            .push_bind(self.uploaded_at)
            .push_bind(self.filetype_id)
            .push_bind(self.uploaded_by)
            .push_bind(self.storage_id)
            .push_bind(self.image_url)
            .push_bind(self.version)
            .push_bind(self.priority_id)
            .push_bind(self.phase_id)
            .push_bind(self.description)
            .push_bind(self.checksum)
            .push_bind(Json(self.custom_properties))
            .push_bind(self.deleted_at);
    }
}

/// Parent ids a document row draws from
#[derive(Debug, Clone)]
pub struct DocumentDependencies {
    pub projects: IdPool,
    pub filetypes: IdPool,
    pub storages: IdPool,
    pub priorities: IdPool,
    pub phases: IdPool,
}

impl DocumentDependencies {
    pub async fn fetch(conn: &mut PgConnection) -> Result<Self> {
        Ok(Self {
            projects: fetch_required(conn, schema::PROJECTS).await?,
            filetypes: fetch_required(conn, schema::FILETYPE).await?,
            storages: fetch_required(conn, schema::STORAGE).await?,
            priorities: fetch_required(conn, schema::PRIORITY).await?,
            phases: fetch_required(conn, schema::PHASE).await?,
        })
    }
}

pub fn generate_documents(
    fake: &mut FakeData,
    deps: &DocumentDependencies,
    count: usize,
) -> Result<Vec<NewDocument>> {
    let mut documents = Vec::with_capacity(count);
    let now = fake.anchor();

    for _ in 0..count {
        let custom_properties = CustomProperties {
            reviewed: fake.chance(0.5),
            tags: vec![fake.word().to_string(), fake.word().to_string()],
            source: fake.one_of(SOURCES).to_string(),
            format: fake.one_of(FORMATS).to_string(),
        };

        documents.push(NewDocument {
            project_id: deps.projects.pick(fake.rng())?,
            filename: fake.file_name(),
            size: fake.int_between(MIN_SIZE, MAX_SIZE),
            uploaded_at: now,
            filetype_id: deps.filetypes.pick(fake.rng())?,
            uploaded_by: fake.name(),
            storage_id: deps.storages.pick(fake.rng())?,
            image_url: fake.image_url(),
            version: Decimal::new(10, 2),
            priority_id: deps.priorities.pick(fake.rng())?,
            phase_id: deps.phases.pick(fake.rng())?,
            description: fake.text(100),
            checksum: fake.sha256_hex(),
            custom_properties,
            deleted_at: fake.chance(SOFT_DELETE_RATIO).then_some(now),
        });
    }

    Ok(documents)
}
