//! Multi-row INSERT built with `QueryBuilder`
//!
//! One statement per chunk instead of one per row. Chunks stay below the
//! Postgres limit of 65535 bind parameters per statement.

use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::{PgConnection, QueryBuilder};

use crate::error::Result;
use crate::schema::Table;

const BIND_LIMIT: usize = 65_535;

/// A generated row that knows its target table and column order
pub trait Insertable {
    const TABLE: Table;
    const COLUMNS: &'static [&'static str];

    /// Push one bind per entry of `COLUMNS`, in the same order
    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>);
}

pub(crate) fn insert_prefix(table: &Table, columns: &[&str]) -> String {
    format!("INSERT INTO {} ({}) ", table.qualified(), columns.join(", "))
}

fn rows_per_statement(column_count: usize) -> usize {
    (BIND_LIMIT / column_count.max(1)).max(1)
}

/// Insert every row, returning the number of rows written
pub async fn insert_rows<R: Insertable>(conn: &mut PgConnection, rows: Vec<R>) -> Result<u64> {
    let per_statement = rows_per_statement(R::COLUMNS.len());
    let mut inserted = 0;
    let mut rows = rows.into_iter().peekable();

    while rows.peek().is_some() {
        let chunk: Vec<R> = rows.by_ref().take(per_statement).collect();

        let mut builder = QueryBuilder::<Postgres>::new(insert_prefix(&R::TABLE, R::COLUMNS));
        builder.push_values(chunk, |mut row_binds, row| row.push_binds(&mut row_binds));

        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(inserted)
}
