//! dbal - dialect-aware SQL query building and execution for MySQL and PostgreSQL
//!
//! Queries are assembled with `?` placeholders and every bind value is
//! escaped into the SQL text by the target [`Dialect`]. A [`Driver`] owns one
//! lazily opened connection and also generates DDL from [`TableDescriptor`]s.
//!
//! # Example
//! ```ignore
//! use dbal::{Config, Registry};
//!
//! let config = Config::load("db.toml")?;
//! let registry = Registry::from_config(&config).await?;
//! let db = registry.get("")?;
//!
//! let mut query = db.select(["id", "name"]);
//! let row = query
//!     .from(["users"])
//!     .where_("name = ?", "John")
//!     .run()
//!     .await?
//!     .single_row()?;
//!
//! let id: Option<i64> = row.get_as("id")?;
//! let name = row.get("name")?;
//!
//! let new_id = db.insert("users", [("name", "Jane")], "id").await?;
//! ```

pub mod builders;
pub mod config;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod escape;
pub mod migrate;
pub mod schema;
pub mod traits;
pub mod types;

mod driver;
mod registry;

// Re-export main types for convenient access
pub use builders::{Conjunction, JoinKind, QueryBuilder};
pub use config::{Config, ConnectionConfig, DriverKind};
pub use dialect::{Dialect, MySqlDialect, PostgresDialect};
pub use driver::Driver;
pub use error::{DbalError, Result};
pub use migrate::{Migration, Migrator};
pub use registry::Registry;
pub use schema::{FieldDescriptor, FieldType, ForeignKey, ForeignKeyAction, IndexKind, TableDescriptor};
pub use traits::Connection;
pub use types::{IntoBinds, QueryResult, RawQueryResult, Row, SqlValue};
