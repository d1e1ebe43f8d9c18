//! projectpulse-seed - synthetic data for the projectpulse schema
//!
//! Resets the schema, fills every table with plausible, referentially
//! consistent rows and verifies the result.
//!
//! ## Pipeline
//! Connect -> Reset -> Reference -> Users/Sessions -> Projects -> Links ->
//! Documents -> Decision logs -> History -> Verify
//!
//! ```rust,no_run
//! use projectpulse_seed::{pipeline, Database, DatabaseConfig, FakeData, SeedCounts, Seeder};
//!
//! # async fn demo() -> projectpulse_seed::Result<()> {
//! let mut db = Database::connect(&DatabaseConfig::from_env()?).await?;
//! let mut seeder = Seeder::new(db.connection(), FakeData::from_seed(42));
//! let summary = pipeline::run(&mut seeder, &SeedCounts::default()).await?;
//! println!("{} rows", summary.total_rows());
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Connection parameters and row counts
pub mod config;

// Table catalog shared by every stage
pub mod schema;

// Connection handling and bulk inserts
pub mod database;

// Seedable value generator
pub mod fake;

// Per-table seeders
pub mod seed;

// Ordered full run
pub mod pipeline;

// Read-only integrity checks
pub mod verify;

pub use config::{DatabaseConfig, SeedCounts};
pub use database::Database;
pub use error::{Result, SeedError};
pub use fake::FakeData;
pub use pipeline::{RunSummary, Stage};
pub use seed::Seeder;
pub use verify::{VerificationReport, Verifier};
