//! Compile-once query cache.

use std::fmt;
use std::sync::OnceLock;

use crate::builder::Expr;
use crate::compiler::TableQuery;
use crate::error::Result;
use crate::schema::{Schema, SchemaRegistry};

/// A query compiled on first use and reused afterwards.
///
/// Meant to live in a `static`, one per call site:
///
/// ```rust
/// # use sqlscope_core::schema::{ColumnDescriptor, Kind, Schema};
/// # use sqlscope_core::{Result, SqlValue};
/// # struct Person;
/// # impl Schema for Person {
/// #     const TABLE: &'static str = "person";
/// #     const COLUMNS: &'static [ColumnDescriptor] =
/// #         &[ColumnDescriptor::new("name", Kind::Text).primary_key()];
/// #     fn to_values(&self) -> Vec<SqlValue> { vec![] }
/// #     fn from_values(_: Vec<SqlValue>) -> Result<Self> { Ok(Self) }
/// # }
/// use sqlscope_core::builder::{col, param};
/// use sqlscope_core::{LazyQuery, SchemaRegistry};
///
/// static BY_NAME: LazyQuery<Person> = LazyQuery::new(|| col("name").eq(param::<String>("name")));
///
/// let registry = SchemaRegistry::new();
/// let query = BY_NAME.get(&registry).unwrap();
/// assert_eq!(query.where_sql(), "person.name = ?1");
/// ```
///
/// The first successful compilation wins; later calls return it regardless
/// of the registry passed in. A failed compilation is not cached.
pub struct LazyQuery<T> {
    build: fn() -> Expr,
    compiled: OnceLock<TableQuery<T>>,
}

impl<T> LazyQuery<T> {
    /// Wraps a filter builder.
    #[must_use]
    pub const fn new(build: fn() -> Expr) -> Self {
        Self {
            build,
            compiled: OnceLock::new(),
        }
    }
}

impl<T: Schema> LazyQuery<T> {
    /// Returns the compiled query, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns the compile error if the filter is invalid.
    pub fn get(&self, registry: &SchemaRegistry) -> Result<&TableQuery<T>> {
        if let Some(query) = self.compiled.get() {
            return Ok(query);
        }
        let query = TableQuery::compile(registry, (self.build)())?;
        // A concurrent caller may have won the race; both results are equal.
        Ok(self.compiled.get_or_init(|| query))
    }
}

impl<T> fmt::Debug for LazyQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyQuery")
            .field("compiled", &self.compiled.get())
            .finish_non_exhaustive()
    }
}
