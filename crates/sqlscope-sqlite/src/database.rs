//! Statement execution over a SQLite pool.
//!
//! [`Database`] owns the pool and the schema registry. Queries compiled
//! through it (or against [`Database::registry`]) are assembled by
//! `sqlscope-core` and run here.

use std::sync::Arc;

use sqlx::sqlite::{SqlitePool, SqliteQueryResult};
use sqlx::Row;
use tracing::{debug, info};

use sqlscope_core::ddl;
use sqlscope_core::{Expr, Operation, Schema, SchemaRegistry, SqlValue, Statement, TableQuery};

use crate::bind::{decode_row, prepare};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// A connection pool paired with the registry queries are compiled against.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    registry: Arc<SchemaRegistry>,
}

impl Database {
    /// Opens a pool as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the URL is invalid or the database
    /// cannot be opened.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await?;
        info!(
            url = %config.url,
            connections = config.pool_size(),
            "Connected to database"
        );
        Ok(Self::with_pool(pool))
    }

    /// Wraps an existing pool with a fresh registry.
    #[must_use]
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self::with_registry(pool, Arc::new(SchemaRegistry::new()))
    }

    /// Wraps an existing pool and a shared registry.
    #[must_use]
    pub const fn with_registry(pool: SqlitePool, registry: Arc<SchemaRegistry>) -> Self {
        Self { pool, registry }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the schema registry.
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Compiles `filter` against `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Core`] with the compile error.
    pub fn query<T: Schema>(&self, filter: Expr) -> Result<TableQuery<T>> {
        Ok(TableQuery::compile(&self.registry, filter)?)
    }

    /// Creates the table of `T` and its indexes, if missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Core`] for a malformed schema, or the database
    /// error.
    pub async fn create_table<T: Schema>(&self) -> Result<()> {
        for sql in ddl::generate_create::<T>(&self.registry)? {
            debug!(sql = %sql, "Executing SQL");
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        info!(table = T::TABLE, "Created table");
        Ok(())
    }

    /// Inserts `value` and returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns the database error, e.g. on a constraint violation.
    pub async fn insert<T: Schema + Sync>(&self, value: &T) -> Result<i64> {
        let statement = Statement::insert(&self.registry, value)?;
        Ok(self.execute(statement).await?.last_insert_rowid())
    }

    /// Inserts `value`, or updates the row with the same primary key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Core`] if `T` has no primary key, or the database
    /// error.
    pub async fn upsert<T: Schema + Sync>(&self, value: &T) -> Result<()> {
        let statement = Statement::upsert(&self.registry, value)?;
        self.execute(statement).await?;
        Ok(())
    }

    /// Updates the row with the primary key of `value`. Returns the
    /// number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Core`] if `T` has no primary key, or the database
    /// error.
    pub async fn update<T: Schema + Sync>(&self, value: &T) -> Result<u64> {
        let statement = Statement::update(&self.registry, value)?;
        Ok(self.execute(statement).await?.rows_affected())
    }

    /// Returns the first matching row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no row matches.
    pub async fn find<T: Schema>(&self, query: &TableQuery<T>, args: &[SqlValue]) -> Result<T> {
        self.find_optional(query, args)
            .await?
            .ok_or_else(|| Error::NotFound {
                table: query.table(),
            })
    }

    /// Returns the first matching row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Core`] if `args` do not fit the query or a row
    /// cannot be decoded, or the database error.
    pub async fn find_optional<T: Schema>(
        &self,
        query: &TableQuery<T>,
        args: &[SqlValue],
    ) -> Result<Option<T>> {
        let statement = query.statement(Operation::FindOne, args)?;
        log(&statement);
        let row = prepare(&statement.sql, statement.params)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| decode::<T>(query, &row)).transpose()
    }

    /// Returns every matching row, in the query's order.
    ///
    /// # Errors
    ///
    /// See [`Database::find_optional`].
    pub async fn find_all<T: Schema>(
        &self,
        query: &TableQuery<T>,
        args: &[SqlValue],
    ) -> Result<Vec<T>> {
        let statement = query.statement(Operation::Find, args)?;
        log(&statement);
        let rows = prepare(&statement.sql, statement.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| decode::<T>(query, row)).collect()
    }

    /// Returns whether any row matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Core`] if `args` do not fit the query, or the
    /// database error.
    pub async fn exists<T: Schema>(&self, query: &TableQuery<T>, args: &[SqlValue]) -> Result<bool> {
        let statement = query.statement(Operation::Exists, args)?;
        log(&statement);
        let row = prepare(&statement.sql, statement.params)
            .fetch_one(&self.pool)
            .await?;
        let found: i64 = row.try_get(0)?;
        Ok(found != 0)
    }

    /// Deletes every matching row and returns how many were deleted.
    ///
    /// Rows in other tables referencing them with `cascade` go too.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Core`] if `args` do not fit the query, or the
    /// database error.
    pub async fn delete<T: Schema>(&self, query: &TableQuery<T>, args: &[SqlValue]) -> Result<u64> {
        let statement = query.statement(Operation::Delete, args)?;
        Ok(self.execute(statement).await?.rows_affected())
    }

    async fn execute(&self, statement: Statement) -> Result<SqliteQueryResult> {
        log(&statement);
        Ok(prepare(&statement.sql, statement.params)
            .execute(&self.pool)
            .await?)
    }
}

fn log(statement: &Statement) {
    debug!(
        sql = %statement.sql,
        params = statement.params.len(),
        "Executing SQL"
    );
}

fn decode<T: Schema>(query: &TableQuery<T>, row: &sqlx::sqlite::SqliteRow) -> Result<T> {
    let values = decode_row(row, query.descriptor().columns())?;
    Ok(T::from_values(values)?)
}
