//! The full reset-then-seed run
//!
//! Stages run strictly in foreign-key dependency order. Each stage commits on
//! its own; the first failure rolls back that stage and aborts the rest of
//! the run, leaving earlier stages committed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::SeedCounts;
use crate::error::Result;
use crate::seed::Seeder;

/// Steps of a seeding run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reset,
    Reference,
    Users,
    Sessions,
    Projects,
    ProjectLinks,
    Documents,
    DecisionLogs,
    ProjectHistory,
    DocumentHistory,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Reset,
        Stage::Reference,
        Stage::Users,
        Stage::Sessions,
        Stage::Projects,
        Stage::ProjectLinks,
        Stage::Documents,
        Stage::DecisionLogs,
        Stage::ProjectHistory,
        Stage::DocumentHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Reference => "reference",
            Self::Users => "users",
            Self::Sessions => "sessions",
            Self::Projects => "projects",
            Self::ProjectLinks => "project_links",
            Self::Documents => "documents",
            Self::DecisionLogs => "decision_logs",
            Self::ProjectHistory => "project_history",
            Self::DocumentHistory => "document_history",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows written by one completed stage
///
/// For `Reset` the count is the number of tables cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub rows: u64,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub anchor: DateTime<Utc>,
    pub counts: SeedCounts,
    pub stages: Vec<StageReport>,
}

impl RunSummary {
    pub fn rows_for(&self, stage: Stage) -> Option<u64> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| report.rows)
    }

    /// Rows inserted across all seeding stages
    pub fn total_rows(&self) -> u64 {
        self.stages
            .iter()
            .filter(|report| report.stage != Stage::Reset)
            .map(|report| report.rows)
            .sum()
    }
}

async fn run_stage(seeder: &mut Seeder<'_>, stage: Stage, counts: &SeedCounts) -> Result<u64> {
    match stage {
        Stage::Reset => seeder.reset().await.map(|tables| tables as u64),
        Stage::Reference => seeder.seed_reference().await,
        Stage::Users => seeder.seed_users(counts.users).await,
        Stage::Sessions => seeder.seed_sessions(counts.sessions).await,
        Stage::Projects => seeder.seed_projects(counts.projects).await,
        Stage::ProjectLinks => seeder.seed_project_links(counts.links_per_table).await,
        Stage::Documents => seeder.seed_documents(counts.documents).await,
        Stage::DecisionLogs => seeder.seed_decision_logs(counts.decision_logs).await,
        Stage::ProjectHistory => seeder.seed_project_history(counts.project_history).await,
        Stage::DocumentHistory => seeder.seed_document_history().await,
    }
}

/// Reset the schema and seed every table
pub async fn run(seeder: &mut Seeder<'_>, counts: &SeedCounts) -> Result<RunSummary> {
    let seed = seeder.fake().seed();
    let anchor = seeder.fake().anchor();
    info!("Starting seeding run (seed {}, anchor {})", seed, anchor);

    let mut stages = Vec::with_capacity(Stage::ALL.len());
    for stage in Stage::ALL {
        let rows = run_stage(seeder, stage, counts)
            .await
            .map_err(|e| e.in_stage(stage))?;
        stages.push(StageReport { stage, rows });
    }

    let summary = RunSummary {
        seed,
        anchor,
        counts: *counts,
        stages,
    };
    info!("Seeding run complete: {} rows", summary.total_rows());
    Ok(summary)
}
