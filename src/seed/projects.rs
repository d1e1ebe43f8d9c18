//! Projects, their join tables and the decision log

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::types::Json;
use sqlx::PgConnection;

use super::{fetch_ids, fetch_required, IdPool};
use crate::database::Insertable;
use crate::error::Result;
use crate::fake::FakeData;
use crate::schema::{self, Table};

/// Share of projects generated soft-deleted
const SOFT_DELETE_RATIO: f64 = 0.1;

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub api: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub setting: String,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub endpoints: Endpoints,
    pub settings: Settings,
    pub owner_id: i32,
    pub image_url: String,
    pub phase_id: i32,
    pub version: Decimal,
    pub license_id: i32,
    pub priority_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<i32>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Insertable for NewProject {
    const TABLE: Table = schema::PROJECTS;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "endpoints",
        "settings",
        "owner_id",
        "image_url",
        "phase_id",
        "version",
        "license_id",
        "priority_id",
        "created_at",
        "updated_at",
        "updated_by",
        "deleted_at",
    ];

    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.title)
            .push_bind(self.description)
            .push_bind(Json(self.endpoints))
            .push_bind(Json(self.settings))
            .push_bind(self.owner_id)
            .push_bind(self.image_url)
            .push_bind(self.phase_id)
            .push_bind(self.version)
            .push_bind(self.license_id)
            .push_bind(self.priority_id)
            .push_bind(self.created_at)
            .push_bind(self.updated_at)
            .push_bind(self.updated_by)
            .push_bind(self.deleted_at);
    }
}

/// Parent ids a project row draws from
#[derive(Debug, Clone)]
pub struct ProjectDependencies {
    pub users: IdPool,
    pub phases: IdPool,
    pub licenses: IdPool,
    pub priorities: IdPool,
}

impl ProjectDependencies {
    pub async fn fetch(conn: &mut PgConnection) -> Result<Self> {
        Ok(Self {
            users: fetch_required(conn, schema::USERS).await?,
            phases: fetch_required(conn, schema::PHASE).await?,
            licenses: fetch_required(conn, schema::LICENSE).await?,
            priorities: fetch_required(conn, schema::PRIORITY).await?,
        })
    }
}

pub fn generate_projects(
    fake: &mut FakeData,
    deps: &ProjectDependencies,
    count: usize,
) -> Result<Vec<NewProject>> {
    let mut projects = Vec::with_capacity(count);
    let now = fake.anchor();

    for _ in 0..count {
        let deleted_at = fake.chance(SOFT_DELETE_RATIO).then_some(now);
        projects.push(NewProject {
            title: fake.catch_phrase(),
            description: fake.text(100),
            endpoints: Endpoints { api: fake.url() },
            settings: Settings {
                setting: fake.word().to_string(),
            },
            owner_id: deps.users.pick(fake.rng())?,
            image_url: fake.image_url(),
            phase_id: deps.phases.pick(fake.rng())?,
            version: Decimal::new(10, 2),
            license_id: deps.licenses.pick(fake.rng())?,
            priority_id: deps.priorities.pick(fake.rng())?,
            created_at: now,
            updated_at: now,
            updated_by: deps.users.pick_optional(fake.rng()),
            deleted_at,
        });
    }

    Ok(projects)
}

// ============================================================================
// Join tables
// ============================================================================

/// Independent uniform pairs `(project_id, other_id)`
///
/// Pairs may repeat; uniqueness, if wanted, is the schema's job.
pub fn generate_links(
    fake: &mut FakeData,
    projects: &IdPool,
    others: &IdPool,
    count: usize,
) -> Result<Vec<(i32, i32)>> {
    (0..count)
        .map(|_| -> Result<(i32, i32)> {
            Ok((projects.pick(fake.rng())?, others.pick(fake.rng())?))
        })
        .collect()
}

macro_rules! link_row {
    ($name:ident, $table:expr, $other:literal, $convert:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub project_id: i32,
            pub other_id: i32,
        }

        impl Insertable for $name {
            const TABLE: Table = $table;
            const COLUMNS: &'static [&'static str] = &["project_id", $other];

            fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
                row.push_bind(self.project_id).push_bind(self.other_id);
            }
        }

        pub fn $convert(pairs: Vec<(i32, i32)>) -> Vec<$name> {
            pairs
                .into_iter()
                .map(|(project_id, other_id)| $name {
                    project_id,
                    other_id,
                })
                .collect()
        }
    };
}

link_row!(ProjectFeature, schema::PROJECT_FEATURE, "feature_id", feature_rows);
link_row!(ProjectTech, schema::PROJECT_TECH_STACK, "tech_id", tech_rows);
link_row!(ProjectTag, schema::PROJECT_TAG, "tag_id", tag_rows);

// ============================================================================
// Decision log
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewDecision {
    pub project_id: i32,
    pub decided_at: DateTime<Utc>,
    pub decided_by: i32,
    pub type_id: i32,
    pub summary: String,
    pub rationale: String,
    pub impact: String,
    pub related_feature_id: Option<i32>,
    pub related_document_id: Option<i32>,
}

impl Insertable for NewDecision {
    const TABLE: Table = schema::DECISION_LOG;
    const COLUMNS: &'static [&'static str] = &[
        "project_id",
        "decided_at",
        "decided_by",
        "type_id",
        "summary",
        "rationale",
        "impact",
        "related_feature_id",
        "related_document_id",
    ];

    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.project_id)
            .push_bind(self.decided_at)
            .push_bind(self.decided_by)
            .push_bind(self.type_id)
            .push_bind(self.summary)
            .push_bind(self.rationale)
            .push_bind(self.impact)
            .push_bind(self.related_feature_id)
            .push_bind(self.related_document_id);
    }
}

/// Parent ids a decision row draws from
///
/// Features and documents back nullable columns and may be empty.
#[derive(Debug, Clone)]
pub struct DecisionDependencies {
    pub projects: IdPool,
    pub users: IdPool,
    pub types: IdPool,
    pub features: IdPool,
    pub documents: IdPool,
}

impl DecisionDependencies {
    pub async fn fetch(conn: &mut PgConnection) -> Result<Self> {
        Ok(Self {
            projects: fetch_required(conn, schema::PROJECTS).await?,
            users: fetch_required(conn, schema::USERS).await?,
            types: fetch_required(conn, schema::DECISION_TYPE).await?,
            features: fetch_ids(conn, schema::FEATURE).await?,
            documents: fetch_ids(conn, schema::DOCUMENTS).await?,
        })
    }
}

pub fn generate_decisions(
    fake: &mut FakeData,
    deps: &DecisionDependencies,
    count: usize,
) -> Result<Vec<NewDecision>> {
    let mut decisions = Vec::with_capacity(count);

    for _ in 0..count {
        decisions.push(NewDecision {
            project_id: deps.projects.pick(fake.rng())?,
            decided_at: fake.anchor(),
            decided_by: deps.users.pick(fake.rng())?,
            type_id: deps.types.pick(fake.rng())?,
            summary: fake.sentence(),
            rationale: fake.text(50),
            impact: fake.text(50),
            related_feature_id: deps.features.pick_optional(fake.rng()),
            related_document_id: deps.documents.pick_optional(fake.rng()),
        });
    }

    Ok(decisions)
}
