//! Convenient imports for common functionality.

pub use crate::background::{Completion, CompletionHandler};
pub use crate::config::{
    DbConfig, MysqlOptions, MysqlOptionsBuilder, SqliteOptions, SqliteOptionsBuilder,
};
pub use crate::conversion::convert_sql_params;
pub use crate::dml::{BATCH_SIZE, InsertBuilder, StageValues, StagedValues, UpdateBuilder};
pub use crate::error::{SqlManagerError, SqlResult};
pub use crate::executor::{AsyncDatabaseExecutor, CompiledQuery, DmlOutcome};
pub use crate::manager::{ColumnInfo, ConnectionState, DbManager, NO_GENERATED_ID};
pub use crate::query_builder::{Filter, OrderDirection, QueryBuilder};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::schema::{ColumnDefinition, TableBuilder, TableSchema};
pub use crate::types::{DatabaseType, LogicalType, ParamConverter, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::exports::{SqliteConnection, SqliteParams};

#[cfg(feature = "mysql")]
pub use crate::exports::{MysqlConnection, MysqlParams};
