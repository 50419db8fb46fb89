//! SQL values and marshalling.
//!
//! [`ToSqlValue`] turns a Rust value into an engine-bindable cell and
//! [`FromSqlValue`] turns a cell back into a Rust value.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Text layout of calendar date-times.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A SQL value that can be bound as a parameter or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Booleans render as `1`/`0` rather than `TRUE`/`FALSE`, which older
    /// SQLite releases do not understand.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => format!("{n}"),
            // Debug keeps the fractional part, so 5.0 stays a REAL literal
            Self::Float(f) => format!("{f:?}"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Returns a short name for the variant, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    /// Returns whether the value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

macro_rules! impl_to_sql_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_int!(i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self.timestamp())
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format(DATETIME_FORMAT).to_string())
    }
}

/// Trait for types that can be rebuilt from SQL values.
pub trait FromSqlValue: Sized {
    /// Converts a cell into `Self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the value has the wrong shape.
    fn from_sql_value(value: SqlValue) -> Result<Self>;
}

fn mismatch<T>(expected: &str, value: &SqlValue) -> Result<T> {
    Err(Error::Decode {
        expected: expected.to_string(),
        found: value.type_name().to_string(),
    })
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        Ok(value)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(i) => Ok(i != 0),
            other => mismatch("boolean", &other),
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Int(i) => Ok(i),
            SqlValue::Bool(b) => Ok(Self::from(b)),
            other => mismatch("integer", &other),
        }
    }
}

macro_rules! impl_from_sql_int {
    ($($ty:ty),+) => {
        $(
            impl FromSqlValue for $ty {
                fn from_sql_value(value: SqlValue) -> Result<Self> {
                    let wide = i64::from_sql_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| Error::Decode {
                        expected: String::from(stringify!($ty)),
                        found: format!("out of range integer {wide}"),
                    })
                }
            }
        )+
    };
}

impl_from_sql_int!(i32, i16, i8, u32, u16, u8);

impl FromSqlValue for f64 {
    // REAL columns may hold integers; SQLite widens them the same way.
    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(i) => Ok(i as Self),
            other => mismatch("real", &other),
        }
    }
}

impl FromSqlValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        f64::from_sql_value(value).map(|f| f as Self)
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => mismatch("text", &other),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            other => mismatch("blob", &other),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        let secs = i64::from_sql_value(value)?;
        Self::from_timestamp(secs, 0).ok_or_else(|| Error::Decode {
            expected: String::from("timestamp"),
            found: format!("out of range epoch seconds {secs}"),
        })
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        let text = String::from_sql_value(value)?;
        Self::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f").map_err(|_| Error::Decode {
            expected: String::from("datetime"),
            found: format!("text {text:?}"),
        })
    }
}
