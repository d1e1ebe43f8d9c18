//! Read-only integrity verifier
//!
//! Runs a static catalog of named checks against the current contents of the
//! schema. A failing check never stops the ones after it; every outcome is
//! collected into a [`VerificationReport`].

use serde::Serialize;
use sqlx::PgConnection;
use tracing::{debug, info, warn};

use crate::schema::{self, Table};

pub mod checks;

pub use checks::{Check, CheckOutcome};

/// Every check the verifier knows about, grouped by kind
pub fn catalog() -> Vec<Check> {
    let mut checks = Vec::new();
    checks.extend(schema::FOREIGN_KEYS.iter().copied().map(Check::ForeignKey));
    checks.extend(schema::JSON_COLUMNS.iter().copied().map(Check::JsonObject));
    checks.extend(schema::TIMESTAMP_COLUMNS.iter().copied().map(Check::Timestamp));
    checks.extend(schema::BOUNDED_COLUMNS.iter().copied().map(Check::Bounded));
    checks.extend(schema::POPULATED_TABLES.iter().copied().map(Check::NonEmpty));
    checks.push(Check::LoginFormat);
    checks
}

/// A check that did not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub passed: Vec<String>,
    pub failed: Vec<CheckFailure>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    fn record(&mut self, outcome: CheckOutcome) {
        let name = outcome.check.name();
        if outcome.passed {
            debug!("PASS {}: {}", name, outcome.detail);
            self.passed.push(name);
        } else {
            warn!("FAIL {}: {}", name, outcome.detail);
            self.failed.push(CheckFailure {
                name,
                message: outcome.detail,
            });
        }
    }
}

/// Executes a set of checks over one connection
#[derive(Debug, Clone)]
pub struct Verifier {
    checks: Vec<Check>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    /// Verifier over the full catalog
    pub fn new() -> Self {
        Self { checks: catalog() }
    }

    /// Verifier over the checks that read `table`
    pub fn for_table(table: Table) -> Self {
        Self {
            checks: catalog()
                .into_iter()
                .filter(|check| check.table() == table)
                .collect(),
        }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Run every check, recording engine errors as failures of that check
    pub async fn run(&self, conn: &mut PgConnection) -> VerificationReport {
        let mut report = VerificationReport::default();
        for check in &self.checks {
            let outcome = match check.run(conn).await {
                Ok(outcome) => outcome,
                Err(e) => CheckOutcome::errored(*check, &e),
            };
            report.record(outcome);
        }
        info!(
            "Verification finished: {} passed, {} failed",
            report.passed.len(),
            report.failed.len()
        );
        report
    }

    /// Shorthand for `Verifier::for_table(table).run(conn)`
    pub async fn run_for_table(conn: &mut PgConnection, table: Table) -> VerificationReport {
        Self::for_table(table).run(conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_covers_every_contract_entry() {
        let checks = catalog();
        let count = |pred: fn(&Check) -> bool| checks.iter().filter(|c| pred(c)).count();

        assert_eq!(
            count(|c| matches!(c, Check::ForeignKey(_))),
            schema::FOREIGN_KEYS.len()
        );
        assert_eq!(count(|c| matches!(c, Check::JsonObject(_))), 7);
        assert_eq!(
            count(|c| matches!(c, Check::Timestamp(_))),
            schema::TIMESTAMP_COLUMNS.len()
        );
        assert_eq!(count(|c| matches!(c, Check::Bounded(_))), 2);
        assert_eq!(count(|c| matches!(c, Check::NonEmpty(_))), 3);
        assert_eq!(count(|c| matches!(c, Check::LoginFormat)), 1);
    }

    #[test]
    fn test_check_names_unique() {
        let checks = catalog();
        let names: HashSet<String> = checks.iter().map(Check::name).collect();
        assert_eq!(names.len(), checks.len());
    }

    #[test]
    fn test_for_table_filters_checks() {
        let verifier = Verifier::for_table(schema::DOCUMENT_HISTORY);
        assert!(!verifier.checks().is_empty());
        assert!(verifier
            .checks()
            .iter()
            .all(|c| c.table() == schema::DOCUMENT_HISTORY));
        // 6 foreign keys, changed_at, version
        assert_eq!(verifier.checks().len(), 8);

        let users = Verifier::for_table(schema::USERS);
        assert!(users.checks().contains(&Check::LoginFormat));
        assert!(users.checks().contains(&Check::NonEmpty(schema::USERS)));
    }

    #[test]
    fn test_report_records_outcomes() {
        let mut report = VerificationReport::default();
        report.record(CheckOutcome {
            check: Check::LoginFormat,
            passed: true,
            detail: "10 logins well-formed".into(),
        });
        report.record(CheckOutcome {
            check: Check::NonEmpty(schema::PROJECTS),
            passed: false,
            detail: "projects.projects is empty".into(),
        });

        assert!(!report.is_clean());
        assert_eq!(report.total(), 2);
        assert_eq!(report.failed[0].name, "non_empty projects.projects");
        assert_eq!(report.failed[0].message, "projects.projects is empty");
    }
}
