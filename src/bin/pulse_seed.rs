//! pulse-seed - populate and verify the projectpulse schema
//!
//! # Usage
//!
//! ```bash
//! # Reset and seed every table with the default counts
//! pulse-seed
//!
//! # Reproducible run with a fixed seed and more users
//! pulse-seed run --seed 42 --users 100 --sessions 300
//!
//! # Clear every table
//! pulse-seed reset
//!
//! # Integrity checks over the current contents
//! pulse-seed verify
//! pulse-seed verify --table audit.document_history --json
//!
//! # Confirm the schema is provisioned
//! pulse-seed check-schema
//! ```
//!
//! Connection parameters come from `DATABASE_URL` and the usual `PG*`
//! variables (a `.env` file is honoured); the flags below override them.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use projectpulse_seed::schema::{self, Table};
use projectpulse_seed::seed::reset;
use projectpulse_seed::{
    pipeline, Database, DatabaseConfig, FakeData, RunSummary, SeedCounts, Seeder,
    VerificationReport, Verifier,
};

const DEFAULT_LOG_FILTER: &str = "projectpulse_seed=info";

#[derive(Parser)]
#[command(name = "pulse-seed")]
#[command(version)]
#[command(about = "Synthetic data generator and integrity verifier for the projectpulse schema")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Generator seed; a random one is chosen and logged when absent
    #[arg(long, global = true, env = "PULSE_SEED")]
    seed: Option<u64>,

    /// Print machine-readable JSON instead of the console report
    #[arg(long, global = true)]
    json: bool,
}

/// Per-field overrides of the environment configuration
#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// Database host (overrides PGHOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Database port (overrides PGPORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Database name (overrides PGDATABASE)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Database user (overrides PGUSER)
    #[arg(long, global = true)]
    user: Option<String>,
}

impl ConnectionArgs {
    fn resolve(&self) -> anyhow::Result<DatabaseConfig> {
        let mut config =
            DatabaseConfig::from_env().context("Failed to read database configuration")?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reset the schema and seed every table (default)
    Run(RunArgs),

    /// Remove every row from every table
    Reset,

    /// Run the integrity checks against the current contents
    Verify {
        /// Only run checks reading this table (schema.name)
        #[arg(long, value_parser = parse_table)]
        table: Option<Table>,
    },

    /// Confirm every expected table exists
    CheckSchema,
}

/// Row count overrides; unset counts keep their defaults
#[derive(Args, Debug, Default)]
struct RunArgs {
    #[arg(long)]
    users: Option<usize>,

    #[arg(long)]
    sessions: Option<usize>,

    #[arg(long)]
    projects: Option<usize>,

    /// Rows per project join table (feature, tech stack, tag)
    #[arg(long)]
    links: Option<usize>,

    #[arg(long)]
    documents: Option<usize>,

    #[arg(long)]
    decision_logs: Option<usize>,

    #[arg(long)]
    project_history: Option<usize>,
}

impl RunArgs {
    fn counts(&self) -> SeedCounts {
        let defaults = SeedCounts::default();
        SeedCounts {
            users: self.users.unwrap_or(defaults.users),
            sessions: self.sessions.unwrap_or(defaults.sessions),
            projects: self.projects.unwrap_or(defaults.projects),
            links_per_table: self.links.unwrap_or(defaults.links_per_table),
            documents: self.documents.unwrap_or(defaults.documents),
            decision_logs: self.decision_logs.unwrap_or(defaults.decision_logs),
            project_history: self.project_history.unwrap_or(defaults.project_history),
        }
    }
}

fn parse_table(raw: &str) -> Result<Table, String> {
    schema::ALL_TABLES
        .iter()
        .copied()
        .find(|table| table.qualified() == raw)
        .ok_or_else(|| format!("Unknown table '{}', expected schema.name", raw))
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.connection.resolve()?;
    let mut db = Database::connect(&config).await?;

    let command = cli.command.unwrap_or(Commands::Run(RunArgs::default()));
    let result = dispatch(&mut db, command, cli.seed, cli.json).await;

    // Closed on both paths; a close failure only matters when the work succeeded.
    match (result, db.close().await) {
        (Ok(code), Ok(())) => Ok(code),
        (Ok(_), Err(e)) => Err(e).context("Failed to close database connection"),
        (Err(e), Err(close)) => {
            warn!("Failed to close database connection: {}", close);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
    }
}

async fn dispatch(
    db: &mut Database,
    command: Commands,
    seed: Option<u64>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Run(args) => cmd_run(db, args.counts(), seed, json).await,
        Commands::Reset => cmd_reset(db, json).await,
        Commands::Verify { table } => cmd_verify(db, table, json).await,
        Commands::CheckSchema => cmd_check_schema(db, json).await,
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

async fn cmd_run(
    db: &mut Database,
    counts: SeedCounts,
    seed: Option<u64>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    db.verify_schema().await?;

    let fake = match seed {
        Some(seed) => FakeData::from_seed(seed),
        None => FakeData::from_entropy(),
    };
    let mut seeder = Seeder::new(db.connection(), fake);
    let summary = pipeline::run(&mut seeder, &counts).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
        println!("{}", "✅ Data generation complete".green().bold());
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_reset(db: &mut Database, json: bool) -> anyhow::Result<ExitCode> {
    let cleared = reset::reset_all(db.connection()).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "tables_cleared": cleared }))?
        );
    } else {
        println!("{} {} tables cleared", "✅ Reset complete:".green().bold(), cleared);
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_verify(
    db: &mut Database,
    table: Option<Table>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let verifier = match table {
        Some(table) => Verifier::for_table(table),
        None => Verifier::new(),
    };
    let report = verifier.run(db.connection()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn cmd_check_schema(db: &mut Database, json: bool) -> anyhow::Result<ExitCode> {
    db.test_connection().await?;
    let missing = db.missing_tables().await?;

    if json {
        let output = serde_json::json!({
            "expected": schema::ALL_TABLES.len(),
            "missing": missing,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if missing.is_empty() {
        println!(
            "{} all {} tables present",
            "✅ Schema OK:".green().bold(),
            schema::ALL_TABLES.len()
        );
    } else {
        for name in &missing {
            println!("  {} {}", "MISSING".red(), name);
        }
    }

    Ok(if missing.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_summary(summary: &RunSummary) {
    println!("\n{} {}", "Seed:".cyan().bold(), summary.seed);
    println!("{} {}", "Anchor:".cyan(), summary.anchor);
    for report in &summary.stages {
        let unit = if report.stage == projectpulse_seed::Stage::Reset {
            "tables"
        } else {
            "rows"
        };
        println!("  {:<18} {:>6} {}", report.stage.to_string(), report.rows, unit.dimmed());
    }
    println!("{} {} rows\n", "Total:".cyan().bold(), summary.total_rows());
}

fn print_report(report: &VerificationReport) {
    for name in &report.passed {
        println!("{} {}", "PASS".green(), name);
    }
    for failure in &report.failed {
        println!("{} {}", "FAIL".red().bold(), failure.name);
        println!("  {}", failure.message.red());
    }

    println!("\n{}", "═".repeat(60));
    let line = format!(
        "{} checks: {} passed, {} failed",
        report.total(),
        report.passed.len(),
        report.failed.len()
    );
    if report.is_clean() {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }
}
