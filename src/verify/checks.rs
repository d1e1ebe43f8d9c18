//! Individual read-only integrity checks

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgConnection, Row};

use crate::error::Result;
use crate::schema::{self, Bound, Column, ForeignKey, Table};

/// Logins reported per failing login check
const SAMPLE_LIMIT: usize = 5;

/// One named assertion over the seeded data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Anti-join: no child row points at a missing parent
    ForeignKey(ForeignKey),
    /// Every value parses as a JSON object
    JsonObject(Column),
    /// Every value decodes as a date-time
    Timestamp(Column),
    /// Every value lies inside an inclusive range
    Bounded(Bound),
    /// The table holds at least one row
    NonEmpty(Table),
    /// `users.login` looks like an e-mail address
    LoginFormat,
}

/// Result of running one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub check: Check,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn pass(check: Check, detail: impl Into<String>) -> Self {
        Self {
            check,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(check: Check, detail: impl Into<String>) -> Self {
        Self {
            check,
            passed: false,
            detail: detail.into(),
        }
    }

    pub(crate) fn errored(check: Check, error: &crate::error::SeedError) -> Self {
        Self::fail(check, format!("check could not run: {error}"))
    }
}

impl Check {
    /// Table the check reads from
    pub fn table(&self) -> Table {
        match self {
            Check::ForeignKey(fk) => fk.table,
            Check::JsonObject(column) | Check::Timestamp(column) => column.table,
            Check::Bounded(bound) => bound.column.table,
            Check::NonEmpty(table) => *table,
            Check::LoginFormat => schema::USERS,
        }
    }

    /// Stable, human-readable check name
    pub fn name(&self) -> String {
        match self {
            Check::ForeignKey(fk) => format!(
                "foreign_key {}.{} -> {}.{}",
                fk.table, fk.column, fk.references, fk.references.key
            ),
            Check::JsonObject(column) => format!("json_object {column}"),
            Check::Timestamp(column) => format!("timestamp {column}"),
            Check::Bounded(bound) => {
                format!("bounded {} in [{}, {}]", bound.column, bound.min, bound.max)
            }
            Check::NonEmpty(table) => format!("non_empty {table}"),
            Check::LoginFormat => format!("login_format {}.login", schema::USERS),
        }
    }

    pub async fn run(&self, conn: &mut PgConnection) -> Result<CheckOutcome> {
        match self {
            Check::ForeignKey(fk) => self.run_foreign_key(conn, fk).await,
            Check::JsonObject(column) => self.run_json_object(conn, column).await,
            Check::Timestamp(column) => self.run_timestamp(conn, column).await,
            Check::Bounded(bound) => self.run_bounded(conn, bound).await,
            Check::NonEmpty(table) => self.run_non_empty(conn, table).await,
            Check::LoginFormat => self.run_login_format(conn).await,
        }
    }

    async fn run_foreign_key(
        &self,
        conn: &mut PgConnection,
        fk: &ForeignKey,
    ) -> Result<CheckOutcome> {
        let orphans: i64 = sqlx::query_scalar(&orphan_count_sql(fk))
            .fetch_one(&mut *conn)
            .await?;

        Ok(if orphans == 0 {
            CheckOutcome::pass(*self, format!("every {} resolves", fk.column))
        } else {
            CheckOutcome::fail(
                *self,
                format!(
                    "{orphans} rows in {} have a {} with no matching {} row",
                    fk.table, fk.column, fk.references
                ),
            )
        })
    }

    async fn run_json_object(
        &self,
        conn: &mut PgConnection,
        column: &Column,
    ) -> Result<CheckOutcome> {
        let sql = format!(
            "SELECT {}::text FROM {}",
            column.name,
            column.table.qualified()
        );
        let values: Vec<Option<String>> = sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?;

        let total = values.len();
        let bad = values
            .iter()
            .filter(|value| !is_json_object(value.as_deref()))
            .count();

        Ok(if bad == 0 {
            CheckOutcome::pass(*self, format!("{total} values are JSON objects"))
        } else {
            CheckOutcome::fail(
                *self,
                format!("{bad} of {total} values in {column} are not JSON objects"),
            )
        })
    }

    async fn run_timestamp(
        &self,
        conn: &mut PgConnection,
        column: &Column,
    ) -> Result<CheckOutcome> {
        let sql = format!("SELECT {} FROM {}", column.name, column.table.qualified());
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let bad = rows
            .iter()
            .filter(|row| {
                // Either flavour of Postgres timestamp counts as well-typed.
                row.try_get::<Option<DateTime<Utc>>, _>(0).is_err()
                    && row.try_get::<Option<NaiveDateTime>, _>(0).is_err()
            })
            .count();

        Ok(if bad == 0 {
            CheckOutcome::pass(*self, format!("{} values decode as timestamps", rows.len()))
        } else {
            CheckOutcome::fail(
                *self,
                format!("{bad} of {} values in {column} are not timestamps", rows.len()),
            )
        })
    }

    async fn run_bounded(&self, conn: &mut PgConnection, bound: &Bound) -> Result<CheckOutcome> {
        let outside: i64 = sqlx::query_scalar(&out_of_bounds_sql(bound))
            .fetch_one(&mut *conn)
            .await?;

        Ok(if outside == 0 {
            CheckOutcome::pass(*self, "all values in range")
        } else {
            CheckOutcome::fail(
                *self,
                format!(
                    "{outside} rows with {} outside [{}, {}]",
                    bound.column, bound.min, bound.max
                ),
            )
        })
    }

    async fn run_non_empty(&self, conn: &mut PgConnection, table: &Table) -> Result<CheckOutcome> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.qualified());
        let rows: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;

        Ok(if rows > 0 {
            CheckOutcome::pass(*self, format!("{rows} rows"))
        } else {
            CheckOutcome::fail(*self, format!("{table} is empty"))
        })
    }

    async fn run_login_format(&self, conn: &mut PgConnection) -> Result<CheckOutcome> {
        let sql = format!("SELECT login FROM {}", schema::USERS.qualified());
        let logins: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?;

        let invalid: Vec<&str> = logins
            .iter()
            .map(String::as_str)
            .filter(|login| !is_login(login))
            .collect();

        Ok(if invalid.is_empty() {
            CheckOutcome::pass(*self, format!("{} logins well-formed", logins.len()))
        } else {
            let sample: Vec<&str> = invalid.iter().take(SAMPLE_LIMIT).copied().collect();
            CheckOutcome::fail(
                *self,
                format!("{} invalid logins, e.g. {}", invalid.len(), sample.join(", ")),
            )
        })
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Anti-join counting child rows whose key has no parent
pub fn orphan_count_sql(fk: &ForeignKey) -> String {
    let null_guard = if fk.nullable {
        format!(" AND c.{} IS NOT NULL", fk.column)
    } else {
        String::new()
    };
    format!(
        "SELECT COUNT(*) FROM {child} c LEFT JOIN {parent} p ON c.{column} = p.{key} \
         WHERE p.{key} IS NULL{null_guard}",
        child = fk.table.qualified(),
        parent = fk.references.qualified(),
        column = fk.column,
        key = fk.references.key,
    )
}

pub fn out_of_bounds_sql(bound: &Bound) -> String {
    format!(
        "SELECT COUNT(*) FROM {table} WHERE {column} < {min} OR {column} > {max}",
        table = bound.column.table.qualified(),
        column = bound.column.name,
        min = bound.min,
        max = bound.max,
    )
}

/// NULL counts as a violation: the generator always writes an object
pub fn is_json_object(raw: Option<&str>) -> bool {
    raw.and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
        .is_some_and(|value| value.is_object())
}

pub fn is_login(login: &str) -> bool {
    login.contains('@') && login.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_sql_required_key() {
        let fk = schema::FOREIGN_KEYS
            .iter()
            .find(|k| k.table == schema::SESSIONS && k.column == "user_id")
            .unwrap();
        assert_eq!(
            orphan_count_sql(fk),
            "SELECT COUNT(*) FROM users.sessions c LEFT JOIN users.users p \
             ON c.user_id = p.user_id WHERE p.user_id IS NULL"
        );
    }

    #[test]
    fn test_orphan_sql_nullable_key_skips_nulls() {
        let fk = schema::FOREIGN_KEYS
            .iter()
            .find(|k| k.column == "related_document_id")
            .unwrap();
        let sql = orphan_count_sql(fk);
        assert!(sql.contains(
            "LEFT JOIN documents.documents p ON c.related_document_id = p.document_id"
        ));
        assert!(sql.ends_with("AND c.related_document_id IS NOT NULL"));
    }

    #[test]
    fn test_out_of_bounds_sql() {
        let sql = out_of_bounds_sql(&schema::BOUNDED_COLUMNS[0]);
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM audit.project_history WHERE version < 0 OR version > 10"
        );
    }

    #[test]
    fn test_is_json_object() {
        assert!(is_json_object(Some(r#"{"field": "title", "old": "a", "new": "b"}"#)));
        assert!(!is_json_object(Some("[1, 2]")));
        assert!(!is_json_object(Some("\"text\"")));
        assert!(!is_json_object(Some("42")));
        assert!(!is_json_object(Some("{not json")));
        assert!(!is_json_object(None));
    }

    #[test]
    fn test_is_login() {
        assert!(is_login("mary.smith12@example.com"));
        assert!(!is_login("marysmith"));
        assert!(!is_login("mary@localhost"));
    }

    #[test]
    fn test_check_names_are_descriptive() {
        let check = Check::ForeignKey(schema::FOREIGN_KEYS[0]);
        assert_eq!(
            check.name(),
            "foreign_key users.sessions.user_id -> users.users.user_id"
        );
        assert_eq!(check.table(), schema::SESSIONS);
        assert_eq!(Check::LoginFormat.name(), "login_format users.users.login");
    }
}
