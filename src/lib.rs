//! Dialect-neutral data access over `SQLite` and `MySQL`.
//!
//! A [`DbManager`] owns one lazily (re)opened connection. Tables are declared with
//! [`TableBuilder`], rows written with [`InsertBuilder`] / [`UpdateBuilder`] and read with
//! [`QueryBuilder`]; the SQL each builder emits is adjusted to the configured backend.
//!
//! ```rust,no_run
//! use sql_manager::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlManagerError> {
//! let db = DbManager::sqlite(SqliteOptions::new("app.db"));
//! db.connect().await?;
//!
//! db.create_table("users")
//!     .add_string_len("username", 50)
//!     .add_boolean_default("active", true)
//!     .add_integer_default("loginCount", 0)
//!     .create()
//!     .await?;
//!
//! let id = db.insert("users").set_string("username", "johndoe").execute().await?;
//! let row = db.query("users").where_eq("id", id).first().await?;
//! # let _ = row;
//! db.close().await?;
//! # Ok(()) }
//! ```

pub mod background;
pub mod config;
pub mod connection;
pub mod conversion;
pub mod dialect;
pub mod dml;
pub mod error;
pub mod executor;
pub mod exports;
pub mod helpers;
pub mod manager;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod schema;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use background::{Completion, CompletionHandler};
pub use config::{DbConfig, MysqlOptions, MysqlOptionsBuilder, SqliteOptions, SqliteOptionsBuilder};
pub use conversion::convert_sql_params;
pub use dml::{InsertBuilder, StageValues, UpdateBuilder};
pub use error::{SqlManagerError, SqlResult};
pub use executor::{AsyncDatabaseExecutor, CompiledQuery, DmlOutcome};
pub use manager::{ColumnInfo, ConnectionState, DbManager, NO_GENERATED_ID};
pub use query_builder::{Filter, QueryBuilder};
pub use results::{CustomDbRow, ResultSet};
pub use schema::{ColumnDefinition, TableBuilder, TableSchema};
pub use types::{DatabaseType, LogicalType, ParamConverter, RowValues};
