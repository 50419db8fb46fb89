//! Query compiler.
//!
//! Turns a filter [`Expr`] over a schema type into a [`TableQuery`]: the
//! rendered WHERE fragment, its parameter arena and an optional ordering.

mod arena;
mod expr;
mod node;
mod order;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::builder::{Expr, Order, SqlValue};
use crate::error::Result;
use crate::schema::{Schema, SchemaDescriptor, SchemaRegistry, TableRef};

pub use arena::{ParamArena, ParamSlot};
pub use order::{compile_order, CompiledOrder};

pub(crate) use order::order_clause;

use expr::{Compiler, Scope};

/// A compiled filter over table `T`.
///
/// Produced once and reused across executions. [`TableQuery::order_by`]
/// returns a new query instead of mutating this one.
pub struct TableQuery<T> {
    descriptor: Arc<SchemaDescriptor>,
    where_sql: String,
    params: Arc<ParamArena>,
    order: Vec<CompiledOrder>,
    _marker: PhantomData<fn() -> T>,
}

// Manual impls so `T` does not need to be `Clone` or `Debug`.
impl<T> Clone for TableQuery<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            where_sql: self.where_sql.clone(),
            params: Arc::clone(&self.params),
            order: self.order.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TableQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableQuery")
            .field("table", &self.descriptor.name())
            .field("where_sql", &self.where_sql)
            .field("params", &self.params)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl<T: Schema> TableQuery<T> {
    /// Compiles `filter` against `T`.
    ///
    /// Bare columns resolve against `T`; qualified references must name `T`
    /// or a table of an enclosing nested query.
    ///
    /// # Errors
    ///
    /// Returns the first schema, resolution, type or guard error found.
    /// No partially compiled query is ever returned.
    #[allow(clippy::needless_pass_by_value)]
    pub fn compile(registry: &SchemaRegistry, filter: Expr) -> Result<Self> {
        let descriptor = registry.register::<T>()?;
        let scope = Scope::root(TableRef::of::<T>());
        let mut compiler = Compiler::new(registry);
        let node = compiler.compile_filter(&filter, &descriptor, &scope)?;
        let where_sql = node.render();
        let params = compiler.into_arena();

        trace!(
            table = descriptor.name(),
            where_sql = %where_sql,
            params = params.len(),
            "Compiled filter"
        );

        Ok(Self {
            descriptor,
            where_sql,
            params: Arc::new(params),
            order: Vec::new(),
            _marker: PhantomData,
        })
    }

    /// Returns a copy of this query with `directives` appended to its
    /// ordering.
    ///
    /// # Errors
    ///
    /// See [`compile_order`].
    pub fn order_by(&self, directives: impl IntoIterator<Item = Order>) -> Result<Self> {
        let mut query = self.clone();
        query
            .order
            .extend(compile_order(&self.descriptor, directives)?);
        Ok(query)
    }
}

impl<T> TableQuery<T> {
    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &'static str {
        self.descriptor.name()
    }

    /// Returns the descriptor of the queried table.
    #[must_use]
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Returns the compiled WHERE fragment.
    #[must_use]
    pub fn where_sql(&self) -> &str {
        &self.where_sql
    }

    /// Returns the parameter arena.
    #[must_use]
    pub fn params(&self) -> &ParamArena {
        &self.params
    }

    /// Returns the ordering keys.
    #[must_use]
    pub fn order(&self) -> &[CompiledOrder] {
        &self.order
    }

    /// Returns the ` ORDER BY ...` suffix, empty when unordered.
    #[must_use]
    pub fn order_sql(&self) -> String {
        order_clause(&self.order)
    }

    /// Resolves the parameter arena into bindable values.
    ///
    /// # Errors
    ///
    /// See [`ParamArena::bind`].
    pub fn bind(&self, args: &[SqlValue]) -> Result<Vec<SqlValue>> {
        self.params.bind(args)
    }
}
