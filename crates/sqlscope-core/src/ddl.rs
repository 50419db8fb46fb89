//! Schema DDL generation for SQLite.
//!
//! # Example
//!
//! ```rust
//! use sqlscope_core::ddl;
//! use sqlscope_core::schema::{ColumnDescriptor, Kind, SchemaDescriptor};
//!
//! let dog = SchemaDescriptor::new(
//!     "dog",
//!     &[
//!         ColumnDescriptor::new("name", Kind::Text).primary_key(),
//!         ColumnDescriptor::new("owner", Kind::Text)
//!             .references("person", "name")
//!             .cascade()
//!             .index(),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     ddl::create_statements(&dog),
//!     vec![
//!         "CREATE TABLE IF NOT EXISTS dog (\n    name TEXT NOT NULL,\n    owner TEXT NOT NULL REFERENCES person(name) ON DELETE CASCADE,\n    PRIMARY KEY (name)\n)",
//!         "CREATE INDEX IF NOT EXISTS dog_owner_index ON dog(owner)",
//!     ]
//! );
//! ```

use crate::error::Result;
use crate::schema::{ColumnDescriptor, IndexKind, Schema, SchemaDescriptor, SchemaRegistry};

/// Returns the `CREATE TABLE` statement followed by one `CREATE INDEX` per
/// indexed column.
#[must_use]
pub fn create_statements(table: &SchemaDescriptor) -> Vec<String> {
    let mut statements = vec![create_table(table)];
    statements.extend(create_indexes(table));
    statements
}

/// Registers `T` and returns its creation statements.
///
/// # Errors
///
/// Returns [`crate::Error::Schema`] if `T` is malformed.
pub fn generate_create<T: Schema>(registry: &SchemaRegistry) -> Result<Vec<String>> {
    let table = registry.register::<T>()?;
    Ok(create_statements(&table))
}

/// Generates `CREATE TABLE IF NOT EXISTS`.
#[must_use]
pub fn create_table(table: &SchemaDescriptor) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", table.name());

    let mut clauses: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("    {}", column_definition(c)))
        .collect();

    let keys: Vec<&str> = table
        .primary_keys()
        .filter(|c| !c.autoincrement)
        .map(|c| c.name)
        .collect();
    if !keys.is_empty() {
        clauses.push(format!("    PRIMARY KEY ({})", keys.join(", ")));
    }

    sql.push_str(&clauses.join(",\n"));
    sql.push_str("\n)");
    sql
}

/// Generates `CREATE [UNIQUE] INDEX IF NOT EXISTS` for every indexed column.
///
/// Index names are prefixed with the table name since SQLite index names
/// are global.
#[must_use]
pub fn create_indexes(table: &SchemaDescriptor) -> Vec<String> {
    table
        .indexed_columns()
        .map(|c| {
            let (keyword, suffix) = match c.index {
                IndexKind::Unique => ("UNIQUE INDEX", "unique"),
                IndexKind::Index | IndexKind::None => ("INDEX", "index"),
            };
            format!(
                "CREATE {keyword} IF NOT EXISTS {table}_{column}_{suffix} ON {table}({column})",
                table = table.name(),
                column = c.name,
            )
        })
        .collect()
}

fn column_definition(column: &ColumnDescriptor) -> String {
    let mut sql = format!("{} {}", column.name, column.kind.sql_type());

    if column.autoincrement {
        sql.push_str(" PRIMARY KEY AUTOINCREMENT");
    } else if !column.kind.is_nullable() {
        sql.push_str(" NOT NULL");
    }

    if let Some(fk) = column.references {
        sql.push_str(" REFERENCES ");
        sql.push_str(fk.table);
        sql.push('(');
        sql.push_str(fk.column);
        sql.push(')');
        if column.cascade {
            sql.push_str(" ON DELETE CASCADE");
        }
    }

    sql
}
