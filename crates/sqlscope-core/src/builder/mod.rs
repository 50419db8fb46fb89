//! Expression builder.
//!
//! Filters are built from plain function calls and fluent methods, then
//! handed to [`crate::TableQuery::compile`]. Column names are only checked at
//! compile time, against the schema registry.
//!
//! # Example
//!
//! ```rust
//! use sqlscope_core::builder::{col, param, val};
//!
//! let adults = col("age").ge(param::<i64>("min_age")).and(col("name").ne(val("root")));
//! let _ = adults;
//! ```
//!
//! Three parameter markers exist:
//!
//! | Builder | Value | Reuse |
//! |---------|-------|-------|
//! | [`param`] | supplied at call time | by name |
//! | [`var`] | captured | by name |
//! | [`val`] | captured | never |
//!
//! Literals passed directly (`col("age").gt(18)`) are inlined into the SQL
//! text instead.

mod expr;
mod order;
pub mod value;

pub use expr::{
    abs, col, column, exists, filter, length, lit, lower, param, qualified, upper, val, var, Expr,
    IntoExpr, SubQuery,
};
pub(crate) use expr::{BinaryOp, ExprNode, Function, NullTest, ParamMarker};
pub use order::{Direction, Order};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
