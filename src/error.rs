//! Error types for the seeding pipeline
//!
//! Library code returns [`SeedError`]; the binary wraps it in `anyhow` at the
//! top level so any failure terminates with a non-zero exit code.

use thiserror::Error;

use crate::pipeline::Stage;

/// Main error type for seeding and verification
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Dependency table {table} is empty; seed it before its dependents")]
    EmptyDependency { table: String },

    #[error("Constraint '{constraint}' violated: {message}")]
    Constraint { constraint: String, message: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Schema is missing tables: {}", .0.join(", "))]
    MissingTables(Vec<String>),

    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<SeedError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SeedError {
    /// Wrap an error with the pipeline stage it came from
    pub fn in_stage(self, stage: Stage) -> Self {
        SeedError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping any stage wrappers
    pub fn root(&self) -> &SeedError {
        match self {
            SeedError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_empty_dependency(&self) -> bool {
        matches!(self.root(), SeedError::EmptyDependency { .. })
    }
}

impl From<sqlx::Error> for SeedError {
    fn from(error: sqlx::Error) -> Self {
        // Named constraint failures (FK, NOT NULL, CHECK, UNIQUE)
        if let sqlx::Error::Database(db_error) = &error {
            if let Some(constraint) = db_error.constraint() {
                return SeedError::Constraint {
                    constraint: constraint.to_string(),
                    message: db_error.message().to_string(),
                };
            }
        }
        SeedError::Database(error)
    }
}

pub type Result<T> = std::result::Result<T, SeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_stage() {
        let err = SeedError::EmptyDependency {
            table: "users.users".to_string(),
        }
        .in_stage(Stage::Sessions);

        assert!(err.is_empty_dependency());
        assert!(err.to_string().contains("sessions"));
        assert!(matches!(
            err.root(),
            SeedError::EmptyDependency { table } if table == "users.users"
        ));
    }

    #[test]
    fn test_missing_tables_message() {
        let err = SeedError::MissingTables(vec![
            "users.users".to_string(),
            "audit.project_history".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Schema is missing tables: users.users, audit.project_history"
        );
    }

    #[test]
    fn test_non_database_sqlx_error_maps_to_database() {
        let err: SeedError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, SeedError::Database(sqlx::Error::RowNotFound)));
    }
}
