//! Database connection management
//!
//! A seeding run owns exactly one connection. It is opened once, used
//! sequentially by every step and closed explicitly when the run ends.

use std::collections::HashSet;

use sqlx::{Connection, PgConnection};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{Result, SeedError};
use crate::schema::{self, Table};

pub mod bulk;

pub use bulk::{insert_rows, Insertable};

/// Single-connection session handle
pub struct Database {
    conn: PgConnection,
    target: String,
}

impl Database {
    /// Open an authenticated session with the given configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let target = config.to_string();
        info!("Connecting to database: {}", target);

        let conn = PgConnection::connect_with(&config.connect_options())
            .await
            .map_err(|source| {
                warn!("Failed to connect to database: {}", source);
                SeedError::Connection {
                    target: target.clone(),
                    source,
                }
            })?;

        info!("Database connection established");
        Ok(Self { conn, target })
    }

    /// Open a session from a `postgres://` URL
    pub async fn connect_url(url: &str) -> Result<Self> {
        let config = DatabaseConfig::from_url(url)?;
        Self::connect(&config).await
    }

    /// Masked description of the connection target
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Test database connectivity
    pub async fn test_connection(&mut self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&mut self.conn).await?;
        Ok(())
    }

    /// Tables of the schema contract that do not exist in the database
    pub async fn missing_tables(&mut self) -> Result<Vec<String>> {
        let schemas: Vec<&str> = schema::ALL_TABLES
            .iter()
            .map(|t| t.schema)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let present: HashSet<String> = sqlx::query_scalar::<_, String>(
            r#"
            SELECT (table_schema || '.' || table_name)::text
            FROM information_schema.tables
            WHERE table_schema::text = ANY($1)
            "#,
        )
        .bind(&schemas)
        .fetch_all(&mut self.conn)
        .await?
        .into_iter()
        .collect();

        Ok(missing_from(&schema::ALL_TABLES, &present))
    }

    /// Confirm every table of the contract exists before any work starts
    pub async fn verify_schema(&mut self) -> Result<()> {
        let missing = self.missing_tables().await?;
        if !missing.is_empty() {
            warn!(
                "Expected tables not found: {}. Provision the schema before seeding",
                missing.join(", ")
            );
            return Err(SeedError::MissingTables(missing));
        }

        debug!("Schema verification complete");
        Ok(())
    }

    /// Close the connection
    pub async fn close(self) -> Result<()> {
        info!("Closing database connection");
        self.conn.close().await?;
        Ok(())
    }
}

fn missing_from(expected: &[Table], present: &HashSet<String>) -> Vec<String> {
    expected
        .iter()
        .map(Table::qualified)
        .filter(|name| !present.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_from_reports_absent_tables_in_order() {
        let present: HashSet<String> = ["users.users", "reference.phase_reference"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing = missing_from(
            &[schema::PHASE, schema::USERS, schema::SESSIONS, schema::PROJECTS],
            &present,
        );

        assert_eq!(missing, vec!["users.sessions", "projects.projects"]);
    }
}
