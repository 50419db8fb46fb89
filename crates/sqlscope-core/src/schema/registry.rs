//! Schema registry.
//!
//! Maps schema types to validated descriptors. Registration is lazy and
//! idempotent: the first compiler operation that touches a schema registers
//! it, later lookups return the cached descriptor.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::{ColumnDescriptor, IndexKind, Kind, Schema, TableRef};
use crate::error::{Error, Result};

/// A validated table declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    name: &'static str,
    columns: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
    /// Validates a column list and builds a descriptor from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the table has no columns, declares a
    /// column twice, nests a nullable kind, has more than one auto-increment
    /// key, combines an auto-increment key with other key columns, or carries
    /// a malformed foreign key.
    pub fn new(name: &'static str, columns: &[ColumnDescriptor]) -> Result<Self> {
        let invalid = |message: String| Error::Schema {
            table: name.to_string(),
            message,
        };

        if !is_identifier(name) {
            return Err(invalid(format!("`{name}` is not a valid table name")));
        }
        if columns.is_empty() {
            return Err(invalid(String::from("a table needs at least one column")));
        }

        for (i, column) in columns.iter().enumerate() {
            if !is_identifier(column.name) {
                return Err(invalid(format!(
                    "`{}` is not a valid column name",
                    column.name
                )));
            }
            if !column.kind.is_well_formed() {
                return Err(invalid(format!(
                    "column {} has a nested nullable kind",
                    column.name
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(invalid(format!("column {} is declared twice", column.name)));
            }
            if column.autoincrement {
                if !column.primary_key {
                    return Err(invalid(format!(
                        "auto-increment column {} must be a primary key",
                        column.name
                    )));
                }
                if column.kind != Kind::Integer {
                    return Err(invalid(format!(
                        "auto-increment column {} must be a non-nullable integer, found {}",
                        column.name, column.kind
                    )));
                }
            }
            match column.references {
                Some(fk) if !is_identifier(fk.table) || !is_identifier(fk.column) => {
                    return Err(invalid(format!(
                        "column {} references `{}.{}`, expected `table.column`",
                        column.name, fk.table, fk.column
                    )));
                }
                None if column.cascade => {
                    return Err(invalid(format!(
                        "column {} cascades deletes but references no table",
                        column.name
                    )));
                }
                _ => {}
            }
        }

        let autoincrement = columns.iter().filter(|c| c.autoincrement).count();
        if autoincrement > 1 {
            return Err(invalid(String::from(
                "more than one auto-increment primary key",
            )));
        }
        if autoincrement == 1 && columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(invalid(String::from(
                "an auto-increment key cannot be part of a composite primary key",
            )));
        }

        Ok(Self {
            name,
            columns: columns.to_vec(),
        })
    }

    /// Returns the table name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the ordered column list.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary-key columns in declaration order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Returns the auto-increment column, if any.
    #[must_use]
    pub fn autoincrement_column(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.autoincrement)
    }

    /// Returns the indexed columns.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.index != IndexKind::None)
    }
}

/// Registry of schema descriptors keyed by type identity.
///
/// Construct one at startup and pass it to every compile call. First-time
/// registration is serialized through a mutex; published descriptors are
/// immutable and shared through `Arc`.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: Mutex<HashMap<TypeId, Arc<SchemaDescriptor>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, or returns its cached descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the declaration of `T` is malformed.
    pub fn register<T: Schema>(&self) -> Result<Arc<SchemaDescriptor>> {
        self.register_table(TableRef::of::<T>())
    }

    pub(crate) fn register_table(&self, table: TableRef) -> Result<Arc<SchemaDescriptor>> {
        // A panic while holding the lock cannot leave a partial entry behind,
        // so a poisoned map is still consistent.
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(descriptor) = tables.get(&table.id) {
            return Ok(Arc::clone(descriptor));
        }

        let descriptor = Arc::new(SchemaDescriptor::new(table.name, table.columns)?);
        debug!(
            table = table.name,
            columns = descriptor.columns.len(),
            "Registered schema"
        );
        tables.insert(table.id, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Returns the descriptor of `T` if it has been registered.
    #[must_use]
    pub fn get<T: Schema>(&self) -> Option<Arc<SchemaDescriptor>> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .cloned()
    }

    /// Looks up a column of `T`, registering `T` on demand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if `T` cannot be registered.
    pub fn lookup_column<T: Schema>(&self, name: &str) -> Result<Option<ColumnDescriptor>> {
        Ok(self.register::<T>()?.column(name).copied())
    }

    /// Returns whether `T` has a column called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if `T` cannot be registered.
    pub fn has_column<T: Schema>(&self, name: &str) -> Result<bool> {
        Ok(self.lookup_column::<T>(name)?.is_some())
    }

    /// Returns the number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether no schema has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
