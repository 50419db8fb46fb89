//! Schema traits and descriptors.
//!
//! This module provides the traits implemented by `#[derive(Table)]` and the
//! descriptors the compiler consults for existence and type checks.

mod registry;

use std::any::TypeId;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::builder::value::SqlValue;
use crate::builder::Expr;
use crate::compiler::TableQuery;
use crate::error::Result;

pub use registry::{SchemaDescriptor, SchemaRegistry};

/// The semantic value category of a column or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// UTF-8 text.
    Text,
    /// Any integer-like value.
    Integer,
    /// Floating point.
    Real,
    /// Boolean, stored as 0/1.
    Boolean,
    /// Point in time stored as Unix-epoch seconds.
    Timestamp,
    /// Calendar date-time stored as `yyyy-MM-dd HH:mm:ss.fff` text (UTC).
    DateTime,
    /// Raw bytes.
    Blob,
    /// A kind that also admits NULL.
    Nullable(&'static Kind),
}

impl Kind {
    /// Returns the nullable wrapper of this kind.
    ///
    /// Wrapping is idempotent: a nullable kind is returned unchanged.
    #[must_use]
    pub const fn nullable(self) -> Self {
        match self {
            Self::Text => Self::Nullable(&Self::Text),
            Self::Integer => Self::Nullable(&Self::Integer),
            Self::Real => Self::Nullable(&Self::Real),
            Self::Boolean => Self::Nullable(&Self::Boolean),
            Self::Timestamp => Self::Nullable(&Self::Timestamp),
            Self::DateTime => Self::Nullable(&Self::DateTime),
            Self::Blob => Self::Nullable(&Self::Blob),
            Self::Nullable(_) => self,
        }
    }

    /// Strips every nullable wrapper.
    #[must_use]
    pub const fn base(self) -> Self {
        match self {
            Self::Nullable(inner) => inner.base(),
            other => other,
        }
    }

    /// Returns whether the kind admits NULL.
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Returns whether the kind wraps at most one nullable layer.
    ///
    /// [`Kind::nullable`] never builds a nested wrapper, but the variant is
    /// public and `Nullable(&Nullable(..))` can still be written by hand.
    #[must_use]
    pub const fn is_well_formed(self) -> bool {
        match self {
            Self::Nullable(inner) => !inner.is_nullable(),
            _ => true,
        }
    }

    /// Returns whether the kind is integer or real.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self.base(), Self::Integer | Self::Real)
    }

    /// Returns whether values of this kind can be ordered with `<` and
    /// friends.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(
            self.base(),
            Self::Integer | Self::Real | Self::Text | Self::Timestamp | Self::DateTime
        )
    }

    /// Returns whether two kinds may be compared for equality.
    ///
    /// Nullability is ignored; integer and real compare with each other.
    #[must_use]
    pub fn is_comparable_with(self, other: Self) -> bool {
        self.base() == other.base() || (self.is_numeric() && other.is_numeric())
    }

    /// Maps the kind to its SQLite column type.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self.base() {
            // SQLite has no bool, use 0/1
            Self::Integer | Self::Boolean | Self::Timestamp => "INTEGER",
            Self::Real => "REAL",
            Self::Text | Self::DateTime => "TEXT",
            Self::Blob => "BLOB",
            Self::Nullable(inner) => inner.sql_type(),
        }
    }

    /// Returns whether a bound value fits this kind.
    #[must_use]
    pub const fn accepts(self, value: &SqlValue) -> bool {
        match (self.base(), value) {
            (_, SqlValue::Null) => self.is_nullable(),
            (Self::Text | Self::DateTime, SqlValue::Text(_))
            | (Self::Integer | Self::Timestamp, SqlValue::Int(_))
            | (Self::Real, SqlValue::Float(_) | SqlValue::Int(_))
            | (Self::Boolean, SqlValue::Bool(_) | SqlValue::Int(_))
            | (Self::Blob, SqlValue::Blob(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::DateTime => write!(f, "datetime"),
            Self::Blob => write!(f, "blob"),
            Self::Nullable(inner) => write!(f, "nullable {inner}"),
        }
    }
}

/// Maps a Rust type to the [`Kind`] of the column that stores it.
pub trait SqlKind {
    /// The kind of columns holding this type.
    const KIND: Kind;
}

macro_rules! impl_sql_kind {
    ($kind:ident: $($ty:ty),+) => {
        $(
            impl SqlKind for $ty {
                const KIND: Kind = Kind::$kind;
            }

            impl SqlKind for Option<$ty> {
                const KIND: Kind = Kind::Nullable(&Kind::$kind);
            }
        )+
    };
}

impl_sql_kind!(Text: String, &str);
impl_sql_kind!(Integer: i8, i16, i32, i64, u8, u16, u32);
impl_sql_kind!(Real: f32, f64);
impl_sql_kind!(Boolean: bool);
impl_sql_kind!(Timestamp: DateTime<Utc>);
impl_sql_kind!(DateTime: NaiveDateTime);
impl_sql_kind!(Blob: Vec<u8>);

/// A foreign-key target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    /// The referenced table.
    pub table: &'static str,
    /// The referenced column.
    pub column: &'static str,
}

/// Index membership of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    /// Not indexed.
    #[default]
    None,
    /// Plain index.
    Index,
    /// Unique index.
    Unique,
}

/// Column-level metadata produced by schema reflection.
///
/// Built with `const` methods so descriptors can live in a `'static` slice:
///
/// ```rust
/// use sqlscope_core::schema::{ColumnDescriptor, Kind};
///
/// const OWNER: ColumnDescriptor = ColumnDescriptor::new("owner", Kind::Text)
///     .references("person", "name")
///     .cascade();
/// assert!(OWNER.cascade);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// The SQL column name.
    pub name: &'static str,
    /// The declared kind.
    pub kind: Kind,
    /// Part of the primary key.
    pub primary_key: bool,
    /// Auto-increment primary key.
    pub autoincrement: bool,
    /// Foreign-key target.
    pub references: Option<ForeignKey>,
    /// `ON DELETE CASCADE` on the foreign key.
    pub cascade: bool,
    /// Index membership.
    pub index: IndexKind,
}

impl ColumnDescriptor {
    /// Creates a plain column.
    #[must_use]
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            primary_key: false,
            autoincrement: false,
            references: None,
            cascade: false,
            index: IndexKind::None,
        }
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as an auto-increment primary key.
    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.primary_key = true;
        self.autoincrement = true;
        self
    }

    /// Adds a foreign key to `table(column)`.
    #[must_use]
    pub const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey { table, column });
        self
    }

    /// Cascades deletes from the referenced row.
    #[must_use]
    pub const fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    /// Adds a plain index on the column.
    #[must_use]
    pub const fn index(mut self) -> Self {
        self.index = IndexKind::Index;
        self
    }

    /// Adds a unique index on the column.
    #[must_use]
    pub const fn unique_index(mut self) -> Self {
        self.index = IndexKind::Unique;
        self
    }
}

/// A user-declared table type.
///
/// Implemented by `#[derive(Table)]`. The column list is the reflection
/// surface the registry consumes; `to_values` and `from_values` marshal a
/// value to and from cells in `COLUMNS` order.
pub trait Schema: Sized + 'static {
    /// The SQL table name.
    const TABLE: &'static str;

    /// The ordered column list.
    const COLUMNS: &'static [ColumnDescriptor];

    /// Converts the value into one bindable cell per column.
    fn to_values(&self) -> Vec<SqlValue>;

    /// Rebuilds a value from one cell per column.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] if a cell does not fit its field.
    fn from_values(values: Vec<SqlValue>) -> Result<Self>;

    /// Compiles `filter` against this table.
    ///
    /// # Errors
    ///
    /// See [`TableQuery::compile`].
    fn query(registry: &SchemaRegistry, filter: Expr) -> Result<TableQuery<Self>> {
        TableQuery::compile(registry, filter)
    }
}

/// Type-erased handle to a [`Schema`] implementation.
///
/// This is what the expression IR stores for qualified references and nested
/// queries, so the distinction between "a table" and "a value" lives in the
/// type system rather than in identifier spelling.
#[derive(Debug, Clone, Copy)]
pub struct TableRef {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) columns: &'static [ColumnDescriptor],
}

impl TableRef {
    /// Returns the handle for `T`.
    #[must_use]
    pub fn of<T: Schema>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::TABLE,
            columns: T::COLUMNS,
        }
    }

    /// Returns the table name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TableRef {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_wrapping() {
        assert_eq!(Kind::Text.nullable(), Kind::Nullable(&Kind::Text));
        assert_eq!(Kind::Text.nullable().nullable(), Kind::Text.nullable());
        assert_eq!(Kind::Nullable(&Kind::Real).base(), Kind::Real);
        assert!(Kind::Integer.nullable().is_nullable());
        assert!(!Kind::Integer.is_nullable());
    }

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(Kind::Text.sql_type(), "TEXT");
        assert_eq!(Kind::Integer.sql_type(), "INTEGER");
        assert_eq!(Kind::Boolean.sql_type(), "INTEGER");
        assert_eq!(Kind::Real.sql_type(), "REAL");
        assert_eq!(Kind::Timestamp.sql_type(), "INTEGER");
        assert_eq!(Kind::DateTime.sql_type(), "TEXT");
        assert_eq!(Kind::Blob.sql_type(), "BLOB");
        assert_eq!(Kind::Real.nullable().sql_type(), "REAL");
    }

    #[test]
    fn test_comparability() {
        assert!(Kind::Integer.is_comparable_with(Kind::Real));
        assert!(Kind::Text.is_comparable_with(Kind::Text.nullable()));
        assert!(!Kind::Text.is_comparable_with(Kind::Integer));
        assert!(!Kind::Boolean.is_comparable_with(Kind::Integer));
        assert!(!Kind::Boolean.is_orderable());
    }

    #[test]
    fn test_rust_type_kinds() {
        assert_eq!(<String as SqlKind>::KIND, Kind::Text);
        assert_eq!(<i32 as SqlKind>::KIND, Kind::Integer);
        assert_eq!(<Option<f64> as SqlKind>::KIND, Kind::Real.nullable());
        assert_eq!(<DateTime<Utc> as SqlKind>::KIND, Kind::Timestamp);
        assert_eq!(<NaiveDateTime as SqlKind>::KIND, Kind::DateTime);
    }

    #[test]
    fn test_accepts() {
        assert!(Kind::Real.accepts(&SqlValue::Int(3)));
        assert!(!Kind::Integer.accepts(&SqlValue::Float(3.0)));
        assert!(!Kind::Text.accepts(&SqlValue::Null));
        assert!(Kind::Text.nullable().accepts(&SqlValue::Null));
        assert!(Kind::Boolean.accepts(&SqlValue::Bool(true)));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::Text.nullable().to_string(), "nullable text");
        assert_eq!(Kind::Timestamp.to_string(), "timestamp");
    }
}
