//! Connection configuration.
//!
//! [`DatabaseConfig`] can be built in code, deserialized from any serde
//! source, or read from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::{Error, Result};

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "SQLSCOPE_DATABASE_URL";

/// Environment variable holding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "SQLSCOPE_MAX_CONNECTIONS";

const DEFAULT_URL: &str = "sqlite::memory:";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// SQLite connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite:pets.db` or `sqlite::memory:`.
    pub url: String,
    /// Pool size. In-memory databases always use a single connection.
    pub max_connections: u32,
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
    /// Enforce foreign keys. Cascade deletes depend on it.
    pub foreign_keys: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_URL),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            create_if_missing: true,
            foreign_keys: true,
        }
    }
}

impl DatabaseConfig {
    /// Creates a configuration for `url` with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// A private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Reads [`DATABASE_URL_VAR`] and [`MAX_CONNECTIONS_VAR`], falling back
    /// to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the pool size is not a number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(DATABASE_URL_VAR) {
            config.url = url;
        }
        if let Some(size) = lookup(MAX_CONNECTIONS_VAR) {
            config.max_connections = size.trim().parse().map_err(|_| {
                Error::Config(format!("{MAX_CONNECTIONS_VAR} must be a number, got {size:?}"))
            })?;
        }
        Ok(config)
    }

    /// Returns whether the URL names an in-memory database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Returns the effective pool size.
    ///
    /// Every connection to an in-memory database opens its own database,
    /// so those are pinned to one connection.
    #[must_use]
    pub fn pool_size(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections.max(1)
        }
    }

    /// Builds the sqlx connect options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the URL cannot be parsed.
    pub fn connect_options(&self) -> Result<SqliteConnectOptions> {
        Ok(SqliteConnectOptions::from_str(&self.url)?
            .create_if_missing(self.create_if_missing)
            .foreign_keys(self.foreign_keys))
    }

    /// Builds the sqlx pool options.
    #[must_use]
    pub fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().max_connections(self.pool_size());
        if self.is_in_memory() {
            // Closing the only connection would drop the database
            options
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            options
        }
    }
}
