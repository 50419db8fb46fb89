//! Ordering compiler.

use std::fmt;

use crate::builder::{Direction, Order};
use crate::error::{Error, Result};
use crate::schema::SchemaDescriptor;

/// A validated `ORDER BY` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompiledOrder {
    column: &'static str,
    direction: Direction,
}

impl CompiledOrder {
    /// Returns the column name.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        self.column
    }

    /// Returns the direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

impl fmt::Display for CompiledOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction)
    }
}

/// Validates `directives` against `table`, preserving their order.
///
/// # Errors
///
/// Returns [`Error::UnknownColumn`] for a column the table does not declare
/// and [`Error::NotNullable`] for `NULLS FIRST`/`NULLS LAST` on a
/// non-nullable column.
pub fn compile_order(
    table: &SchemaDescriptor,
    directives: impl IntoIterator<Item = Order>,
) -> Result<Vec<CompiledOrder>> {
    directives
        .into_iter()
        .map(|order| {
            let column = table
                .column(order.column())
                .ok_or_else(|| Error::UnknownColumn {
                    column: order.column().to_string(),
                    table: table.name().to_string(),
                    location: order.location(),
                })?;
            if order.direction().requires_nullable() && !column.kind.is_nullable() {
                return Err(Error::NotNullable {
                    column: column.name.to_string(),
                    location: order.location(),
                });
            }
            Ok(CompiledOrder {
                column: column.name,
                direction: order.direction(),
            })
        })
        .collect()
}

/// Renders ` ORDER BY ...`, or nothing for an empty list.
pub fn order_clause(order: &[CompiledOrder]) -> String {
    if order.is_empty() {
        return String::new();
    }
    let keys: Vec<String> = order.iter().map(ToString::to_string).collect();
    format!(" ORDER BY {}", keys.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, Kind};

    fn person() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "person",
            &[
                ColumnDescriptor::new("name", Kind::Text).primary_key(),
                ColumnDescriptor::new("age", Kind::Integer),
                ColumnDescriptor::new("note", Kind::Text.nullable()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_order_clause_preserves_directive_order() {
        let order = compile_order(&person(), [Order::asc("age"), Order::desc("name")]).unwrap();
        assert_eq!(order_clause(&order), " ORDER BY age ASC, name DESC");
    }

    #[test]
    fn test_empty_order_renders_nothing() {
        let order = compile_order(&person(), []).unwrap();
        assert_eq!(order_clause(&order), "");
    }

    #[test]
    fn test_nulls_first_requires_nullable() {
        let err = compile_order(&person(), [Order::nulls_first("age")]).unwrap_err();
        assert!(err.to_string().ends_with("age is not nullable"));

        let order = compile_order(&person(), [Order::nulls_last("note")]).unwrap();
        assert_eq!(order_clause(&order), " ORDER BY note NULLS LAST");
    }

    #[test]
    fn test_unknown_order_column() {
        let err = compile_order(&person(), [Order::asc("email")]).unwrap_err();
        assert!(err.to_string().ends_with("email doesn't exist in person"));
        assert_eq!(err.location().map(|l| l.file()), Some(file!()));
    }
}
