//! # sqlscope-core
//!
//! A typed query-construction layer for SQLite-compatible engines.
//!
//! Schemas are declared once (usually through `#[derive(Table)]` from
//! `sqlscope-derive`). Boolean filter expressions over those schemas are
//! built with a small embedded API and compiled into a parameterized SQL
//! fragment. Compilation checks:
//!
//! - that every column exists in the table it is resolved against
//! - that qualified table references only name tables currently in scope
//! - that operand kinds match each operator's signature
//! - that parameter positions are stable and reused per identifier
//!
//! ## Example
//!
//! ```rust
//! use sqlscope_core::builder::{col, val};
//! use sqlscope_core::schema::{ColumnDescriptor, Kind, Schema};
//! use sqlscope_core::{Result, SchemaRegistry, SqlValue, TableQuery};
//!
//! struct Item {
//!     name: String,
//!     price: f64,
//! }
//!
//! impl Schema for Item {
//!     const TABLE: &'static str = "Item";
//!     const COLUMNS: &'static [ColumnDescriptor] = &[
//!         ColumnDescriptor::new("name", Kind::Text).primary_key(),
//!         ColumnDescriptor::new("price", Kind::Real),
//!     ];
//!
//!     fn to_values(&self) -> Vec<SqlValue> {
//!         vec![SqlValue::Text(self.name.clone()), SqlValue::Float(self.price)]
//!     }
//!
//!     fn from_values(values: Vec<SqlValue>) -> Result<Self> {
//!         let mut values = values.into_iter();
//!         Ok(Self {
//!             name: sqlscope_core::__private::take(&mut values, "name")?,
//!             price: sqlscope_core::__private::take(&mut values, "price")?,
//!         })
//!     }
//! }
//!
//! let registry = SchemaRegistry::new();
//! let query = TableQuery::<Item>::compile(&registry, col("price").gt(val(5.0))).unwrap();
//!
//! assert_eq!(query.where_sql(), "Item.price > ?1");
//! assert_eq!(query.bind(&[]).unwrap(), vec![SqlValue::Float(5.0)]);
//! ```

pub mod builder;
mod cache;
pub mod compiler;
pub mod ddl;
mod error;
pub mod schema;
pub mod statement;

pub use builder::value::{FromSqlValue, SqlValue, ToSqlValue};
pub use builder::{col, column, exists, filter, lit, param, val, var, Direction, Expr, Order};
pub use cache::LazyQuery;
pub use compiler::{CompiledOrder, ParamArena, ParamSlot, TableQuery};
pub use error::{Error, Result};
pub use schema::{ColumnDescriptor, Kind, Schema, SchemaDescriptor, SchemaRegistry, SqlKind};
pub use statement::{Operation, Statement};

/// Support items for code generated by `#[derive(Table)]`.
#[doc(hidden)]
pub mod __private {
    use crate::builder::value::{FromSqlValue, SqlValue};
    use crate::error::{Error, Result};

    /// Takes the next cell of a row and decodes it for `column`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the row is exhausted or the cell does
    /// not fit `T`.
    pub fn take<T: FromSqlValue>(
        values: &mut impl Iterator<Item = SqlValue>,
        column: &str,
    ) -> Result<T> {
        let value = values.next().ok_or_else(|| Error::Decode {
            expected: format!("a value for column {column}"),
            found: String::from("end of row"),
        })?;
        T::from_sql_value(value)
    }
}
