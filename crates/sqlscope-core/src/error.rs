//! Error types for query compilation and value marshalling.

use std::panic::Location;

/// Errors raised while registering schemas, compiling queries, binding
/// parameters or decoding values.
///
/// Every compile-time variant that originates from a builder call carries the
/// source location of that call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A schema declaration is malformed.
    #[error("invalid schema for table {table}: {message}")]
    Schema {
        /// The table whose declaration is invalid.
        table: String,
        /// What is wrong with it.
        message: String,
    },

    /// A column could not be resolved against the current table.
    #[error("{location}: {column} doesn't exist in {table}")]
    UnknownColumn {
        /// The unresolved column name.
        column: String,
        /// The table it was resolved against.
        table: String,
        /// Where the reference was built.
        location: &'static Location<'static>,
    },

    /// A qualified reference names a table that is not in scope.
    #[error("{location}: {table} is not currently accessible")]
    NotAccessible {
        /// The table that was referenced.
        table: String,
        /// Where the reference was built.
        location: &'static Location<'static>,
    },

    /// An operator was applied to operands of the wrong kind.
    #[error("{location}: type mismatch in {context}: expected {expected}, found {found}")]
    Type {
        /// The operator or construct being checked.
        context: String,
        /// The expected kind.
        expected: String,
        /// The kind that was found.
        found: String,
        /// Where the offending expression was built.
        location: &'static Location<'static>,
    },

    /// A construct that is well-typed but disallowed.
    #[error("{location}: {message}")]
    Guard {
        /// Why the construct is rejected.
        message: String,
        /// Where the construct was built.
        location: &'static Location<'static>,
    },

    /// A null-only operation was applied to a non-nullable column.
    #[error("{location}: {column} is not nullable")]
    NotNullable {
        /// The column or expression that is not nullable.
        column: String,
        /// Where the operation was built.
        location: &'static Location<'static>,
    },

    /// The number of runtime arguments does not match the query.
    #[error("expected {expected} runtime parameters, got {got}")]
    ArgumentCount {
        /// Number of runtime parameter slots in the query.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// A runtime argument does not fit the kind of its parameter slot.
    #[error("parameter ?{position} expects {expected}, got {found}")]
    ArgumentType {
        /// 1-based parameter position.
        position: usize,
        /// The kind of the slot.
        expected: String,
        /// The value that was supplied.
        found: String,
    },

    /// A stored value could not be converted into a Rust value.
    #[error("cannot decode {found} as {expected}")]
    Decode {
        /// What the caller asked for.
        expected: String,
        /// What the cell contained.
        found: String,
    },
}

impl Error {
    /// Returns true for errors raised while resolving identifiers or tables.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::UnknownColumn { .. } | Self::NotAccessible { .. })
    }

    /// Returns the source location of the builder call that caused the
    /// error, if any.
    #[must_use]
    pub const fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Self::UnknownColumn { location, .. }
            | Self::NotAccessible { location, .. }
            | Self::Type { location, .. }
            | Self::Guard { location, .. }
            | Self::NotNullable { location, .. } => Some(*location),
            Self::Schema { .. }
            | Self::ArgumentCount { .. }
            | Self::ArgumentType { .. }
            | Self::Decode { .. } => None,
        }
    }
}

/// Result type alias for compilation and marshalling.
pub type Result<T> = std::result::Result<T, Error>;
