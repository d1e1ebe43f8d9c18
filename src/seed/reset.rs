//! Return the schema to an empty-but-structured state

use sqlx::{Connection, PgConnection};
use tracing::info;

use crate::error::Result;
use crate::schema::{self, Table};

/// `TRUNCATE` statement covering every table of the contract
///
/// Identity sequences restart so a seeded run reproduces the same keys.
pub fn truncate_statement(tables: &[Table]) -> String {
    let names: Vec<String> = tables.iter().map(Table::qualified).collect();
    format!(
        "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
        names.join(", ")
    )
}

/// Truncate every table, returning how many were cleared
///
/// The caller owns the transaction; nothing is visible until it commits.
pub async fn truncate_all(conn: &mut PgConnection) -> Result<usize> {
    sqlx::query(&truncate_statement(&schema::ALL_TABLES))
        .execute(&mut *conn)
        .await?;
    Ok(schema::ALL_TABLES.len())
}

/// Truncate every table in a transaction of its own and commit
pub async fn reset_all(conn: &mut PgConnection) -> Result<usize> {
    let mut tx = conn.begin().await?;
    let cleared = truncate_all(&mut tx).await?;
    tx.commit().await?;
    info!("Reset {} tables", cleared);
    Ok(cleared)
}
