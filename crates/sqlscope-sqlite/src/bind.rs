//! Conversions between `SqlValue` cells and sqlx.

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};

use sqlscope_core::{ColumnDescriptor, Kind, SqlValue};

use crate::error::Result;

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Binds a [`SqlValue`] parameter to a raw query.
pub fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Prepares `sql` with `params` bound in position order.
pub fn prepare(sql: &str, params: Vec<SqlValue>) -> SqliteQuery<'_> {
    params.into_iter().fold(sqlx::query(sql), bind_param)
}

/// Reads a `SELECT *` row back into one cell per column.
pub fn decode_row(row: &SqliteRow, columns: &[ColumnDescriptor]) -> Result<Vec<SqlValue>> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| decode_cell(row, index, column.kind))
        .collect()
}

fn decode_cell(row: &SqliteRow, index: usize, kind: Kind) -> Result<SqlValue> {
    let value = match kind.base() {
        Kind::Integer | Kind::Timestamp => row.try_get::<Option<i64>, _>(index)?.map(SqlValue::Int),
        // Stored as 0/1
        Kind::Boolean => row
            .try_get::<Option<i64>, _>(index)?
            .map(|i| SqlValue::Bool(i != 0)),
        Kind::Real => row.try_get::<Option<f64>, _>(index)?.map(SqlValue::Float),
        Kind::Blob => row.try_get::<Option<Vec<u8>>, _>(index)?.map(SqlValue::Blob),
        Kind::Text | Kind::DateTime | Kind::Nullable(_) => {
            row.try_get::<Option<String>, _>(index)?.map(SqlValue::Text)
        }
    };
    Ok(value.unwrap_or(SqlValue::Null))
}
