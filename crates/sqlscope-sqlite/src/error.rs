//! Error types for query execution.

use thiserror::Error;

/// Errors raised while running compiled statements.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Compile, binding or row decoding error.
    #[error(transparent)]
    Core(#[from] sqlscope_core::Error),

    /// A single-row find matched nothing.
    #[error("no row found in {table}")]
    NotFound {
        /// Queried table.
        table: &'static str,
    },

    /// Invalid connection configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns whether this is a [`Error::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for execution.
pub type Result<T> = std::result::Result<T, Error>;
