//! Statement assembly.
//!
//! Read and delete statements wrap a compiled [`TableQuery`]. Write
//! statements (insert, upsert, update) are derived from the schema alone.

use std::fmt::Write;

use crate::builder::SqlValue;
use crate::compiler::{order_clause, TableQuery};
use crate::error::{Error, Result};
use crate::schema::{ColumnDescriptor, Schema, SchemaDescriptor, SchemaRegistry};

/// What a compiled query is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Every matching row, in order.
    Find,
    /// At most one matching row.
    FindOne,
    /// Whether any row matches.
    Exists,
    /// Delete every matching row.
    Delete,
}

/// Complete statement text and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `?N` placeholders.
    pub sql: String,
    /// One value per placeholder position.
    pub params: Vec<SqlValue>,
}

impl<T> TableQuery<T> {
    /// Renders the statement text for `operation`.
    #[must_use]
    pub fn sql(&self, operation: Operation) -> String {
        let table = self.table();
        let filter = self.where_sql();
        match operation {
            Operation::Find => {
                format!(
                    "SELECT * FROM {table} WHERE {filter}{}",
                    order_clause(self.order())
                )
            }
            Operation::FindOne => {
                format!(
                    "SELECT * FROM {table} WHERE {filter}{} LIMIT 1",
                    order_clause(self.order())
                )
            }
            Operation::Exists => {
                format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE {filter} LIMIT 1)")
            }
            Operation::Delete => format!("DELETE FROM {table} WHERE {filter}"),
        }
    }

    /// Assembles the statement for `operation`, binding `args` to the
    /// runtime parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentCount`] or [`Error::ArgumentType`] if `args`
    /// does not fit the query.
    pub fn statement(&self, operation: Operation, args: &[SqlValue]) -> Result<Statement> {
        Ok(Statement {
            sql: self.sql(operation),
            params: self.bind(args)?,
        })
    }
}

impl Statement {
    /// `INSERT INTO t (...) VALUES (...)`, leaving out the auto-increment
    /// key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if `T` is malformed or `to_values` does not
    /// produce one cell per column.
    pub fn insert<T: Schema>(registry: &SchemaRegistry, value: &T) -> Result<Self> {
        let table = registry.register::<T>()?;
        let cells = cells(&table, value)?;
        let (columns, params): (Vec<_>, Vec<_>) = cells
            .into_iter()
            .filter(|(column, _)| !column.autoincrement)
            .map(|(column, value)| (column.name, value))
            .unzip();

        Ok(Self {
            sql: insert_sql(table.name(), &columns),
            params,
        })
    }

    /// `INSERT ... ON CONFLICT (<pk>) DO UPDATE SET c = excluded.c`.
    ///
    /// A table made only of key columns gets `DO NOTHING`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if `T` has no primary key.
    pub fn upsert<T: Schema>(registry: &SchemaRegistry, value: &T) -> Result<Self> {
        let table = registry.register::<T>()?;
        let keys = key_names(&table)?;
        let cells = cells(&table, value)?;

        let columns: Vec<&str> = cells.iter().map(|(column, _)| column.name).collect();
        let mut sql = insert_sql(table.name(), &columns);
        let _ = write!(sql, " ON CONFLICT ({}) ", keys.join(", "));

        let updates: Vec<String> = cells
            .iter()
            .filter(|(column, _)| !column.primary_key)
            .map(|(column, _)| format!("{0} = excluded.{0}", column.name))
            .collect();
        if updates.is_empty() {
            sql.push_str("DO NOTHING");
        } else {
            sql.push_str("DO UPDATE SET ");
            sql.push_str(&updates.join(", "));
        }

        Ok(Self {
            sql,
            params: cells.into_iter().map(|(_, value)| value).collect(),
        })
    }

    /// `UPDATE t SET ... WHERE <pk> = ...`, matching on the primary key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if `T` has no primary key or no non-key
    /// column.
    pub fn update<T: Schema>(registry: &SchemaRegistry, value: &T) -> Result<Self> {
        let table = registry.register::<T>()?;
        key_names(&table)?;
        let (keys, fields): (Vec<_>, Vec<_>) = cells(&table, value)?
            .into_iter()
            .partition(|(column, _)| column.primary_key);
        if fields.is_empty() {
            return Err(Error::Schema {
                table: table.name().to_string(),
                message: String::from("no non-key column to update"),
            });
        }

        let mut params = Vec::with_capacity(keys.len() + fields.len());
        let mut assignments = Vec::with_capacity(fields.len());
        for (column, value) in fields {
            params.push(value);
            assignments.push(format!("{} = ?{}", column.name, params.len()));
        }
        let mut conditions = Vec::with_capacity(keys.len());
        for (column, value) in keys {
            params.push(value);
            conditions.push(format!("{} = ?{}", column.name, params.len()));
        }

        Ok(Self {
            sql: format!(
                "UPDATE {} SET {} WHERE {}",
                table.name(),
                assignments.join(", "),
                conditions.join(" AND ")
            ),
            params,
        })
    }
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn key_names(table: &SchemaDescriptor) -> Result<Vec<&'static str>> {
    let keys: Vec<&'static str> = table.primary_keys().map(|c| c.name).collect();
    if keys.is_empty() {
        return Err(Error::Schema {
            table: table.name().to_string(),
            message: String::from("a primary key is required"),
        });
    }
    Ok(keys)
}

fn cells<T: Schema>(
    table: &SchemaDescriptor,
    value: &T,
) -> Result<Vec<(ColumnDescriptor, SqlValue)>> {
    let values = value.to_values();
    if values.len() != table.columns().len() {
        return Err(Error::Schema {
            table: table.name().to_string(),
            message: format!(
                "produced {} values for {} columns",
                values.len(),
                table.columns().len()
            ),
        });
    }
    Ok(table.columns().iter().copied().zip(values).collect())
}
