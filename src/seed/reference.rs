//! Fixed enumeration rows for the lookup tables
//!
//! Always runs right after a reset, so there is no duplicate detection.

use sqlx::postgres::Postgres;
use sqlx::{PgConnection, QueryBuilder};

use crate::database::bulk::insert_prefix;
use crate::error::Result;
use crate::schema::{self, Table};

/// Hardcoded rows for one reference table; every column is text
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub table: Table,
    pub columns: &'static [&'static str],
    pub rows: &'static [&'static [&'static str]],
}

pub const CATALOGS: &[Catalog] = &[
    Catalog {
        table: schema::TECH_STACK,
        columns: &["technology"],
        rows: &[&["Python"], &["Docker"], &["PostgreSQL"], &["React"], &["Node.js"]],
    },
    Catalog {
        table: schema::FEATURE,
        columns: &["feature"],
        rows: &[&["Login"], &["Search"], &["Export"], &["Analytics"], &["Notifications"]],
    },
    Catalog {
        table: schema::ACCESS_ROLE,
        columns: &["role", "capabilities"],
        rows: &[&["Admin", "all"], &["Editor", "write"], &["Viewer", "read"]],
    },
    Catalog {
        table: schema::LICENSE,
        columns: &["license_name", "description"],
        rows: &[
            &["MIT", "Permissive"],
            &["GPL", "Copyleft"],
            &["Apache", "Flexible"],
        ],
    },
    Catalog {
        table: schema::PHASE,
        columns: &["phase_name", "description"],
        rows: &[
            &["Planning", "Initial"],
            &["Development", "Active"],
            &["Testing", "QA"],
            &["Deployment", "Live"],
        ],
    },
    Catalog {
        table: schema::DECISION_TYPE,
        columns: &["type_name"],
        rows: &[&["Approve"], &["Reject"], &["Defer"]],
    },
    Catalog {
        table: schema::TAG,
        columns: &["tag", "category"],
        rows: &[
            &["Security", "Compliance"],
            &["UI", "Design"],
            &["Backend", "Architecture"],
        ],
    },
    Catalog {
        table: schema::FILETYPE,
        columns: &["extension", "mime_type", "description"],
        rows: &[
            &["pdf", "application/pdf", "PDF document"],
            &["txt", "text/plain", "Text file"],
        ],
    },
    Catalog {
        table: schema::STORAGE,
        columns: &["provider", "location", "retention_policy"],
        rows: &[
            &["AWS", "us-east-1", "30d"],
            &["GCP", "europe-west1", "90d"],
        ],
    },
    Catalog {
        table: schema::PRIORITY,
        columns: &["priority_name"],
        rows: &[&["Low"], &["Medium"], &["High"]],
    },
];

/// Insert one catalog in a single statement
pub async fn insert_catalog(conn: &mut PgConnection, catalog: &Catalog) -> Result<u64> {
    if catalog.rows.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<Postgres>::new(insert_prefix(&catalog.table, catalog.columns));
    builder.push_values(catalog.rows.iter(), |mut row_binds, row| {
        for value in row.iter() {
            row_binds.push_bind(*value);
        }
    });

    let result = builder.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Insert every catalog, returning the total row count
pub async fn insert_catalogs(conn: &mut PgConnection) -> Result<u64> {
    let mut inserted = 0;
    for catalog in CATALOGS {
        inserted += insert_catalog(conn, catalog).await?;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_reference_table_has_a_catalog() {
        for table in schema::REFERENCE_TABLES {
            assert!(
                CATALOGS.iter().any(|c| c.table == table),
                "no catalog for {table}"
            );
        }
        assert_eq!(CATALOGS.len(), schema::REFERENCE_TABLES.len());
    }

    #[test]
    fn test_rows_match_column_count() {
        for catalog in CATALOGS {
            assert!(!catalog.rows.is_empty());
            for row in catalog.rows {
                assert_eq!(row.len(), catalog.columns.len(), "{}", catalog.table);
            }
        }
    }

    #[test]
    fn test_catalog_sizes() {
        let total: usize = CATALOGS.iter().map(|c| c.rows.len()).sum();
        assert_eq!(total, 5 + 5 + 3 + 3 + 4 + 3 + 3 + 2 + 2 + 3);
    }
}
