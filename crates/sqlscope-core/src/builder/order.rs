//! Ordering directives.

use std::fmt;
use std::panic::Location;

/// Sort direction of one `ORDER BY` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `ASC`
    Asc,
    /// `DESC`
    Desc,
    /// `NULLS FIRST`, only valid on nullable columns.
    NullsFirst,
    /// `NULLS LAST`, only valid on nullable columns.
    NullsLast,
}

impl Direction {
    /// Returns whether the direction is only defined for nullable columns.
    #[must_use]
    pub const fn requires_nullable(self) -> bool {
        matches!(self, Self::NullsFirst | Self::NullsLast)
    }

    /// Returns the SQL keyword(s).
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::NullsFirst => "NULLS FIRST",
            Self::NullsLast => "NULLS LAST",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One `ORDER BY` key: a column of the queried table and a direction.
///
/// ```rust
/// use sqlscope_core::builder::{Direction, Order};
///
/// let order = Order::desc("created_at");
/// assert_eq!(order.column(), "created_at");
/// assert_eq!(order.direction(), Direction::Desc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    column: String,
    direction: Direction,
    location: &'static Location<'static>,
}

impl Order {
    #[track_caller]
    fn new(column: &str, direction: Direction) -> Self {
        Self {
            column: String::from(column),
            direction,
            location: Location::caller(),
        }
    }

    /// Ascending order.
    #[track_caller]
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self::new(column, Direction::Asc)
    }

    /// Descending order.
    #[track_caller]
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self::new(column, Direction::Desc)
    }

    /// NULL values first.
    #[track_caller]
    #[must_use]
    pub fn nulls_first(column: &str) -> Self {
        Self::new(column, Direction::NullsFirst)
    }

    /// NULL values last.
    #[track_caller]
    #[must_use]
    pub fn nulls_last(column: &str) -> Self {
        Self::new(column, Direction::NullsLast)
    }

    /// Returns the column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns where the directive was built.
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }
}
