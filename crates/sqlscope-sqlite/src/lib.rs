//! # sqlscope-sqlite
//!
//! Runs `sqlscope-core` compiled queries against SQLite through `sqlx`.
//!
//! Compilation happens once, in `sqlscope-core`. This crate only assembles
//! the statement for an operation, binds the parameter list in position
//! order and decodes result rows back into schema values.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlscope_core::builder::{col, param};
//! use sqlscope_core::schema::{ColumnDescriptor, Kind, Schema};
//! use sqlscope_core::SqlValue;
//! use sqlscope_sqlite::{Database, DatabaseConfig};
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
//!     fn from_values(values: Vec<SqlValue>) -> sqlscope_core::Result<Self> {
//!         let mut values = values.into_iter();
//!         Ok(Self {
//!             name: sqlscope_core::__private::take(&mut values, "name")?,
//!             price: sqlscope_core::__private::take(&mut values, "price")?,
//!         })
//!     }
//! }
//!
//! # async fn run() -> sqlscope_sqlite::Result<()> {
//! let db = Database::connect(&DatabaseConfig::in_memory()).await?;
//! db.create_table::<Item>().await?;
//! db.insert(&Item { name: String::from("Lamp"), price: 9.0 }).await?;
//!
//! let cheaper = db.query::<Item>(col("price").lt(param::<f64>("max")))?;
//! let items = db.find_all(&cheaper, &[SqlValue::Float(10.0)]).await?;
//! assert_eq!(items.len(), 1);
//! # Ok(())
//! # }
//! ```

mod bind;
mod config;
mod database;
mod error;

pub use config::{DatabaseConfig, DATABASE_URL_VAR, MAX_CONNECTIONS_VAR};
pub use database::Database;
pub use error::{Error, Result};
