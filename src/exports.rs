//! Backend-specific exports, gated by feature.

#[cfg(feature = "sqlite")]
pub use crate::sqlite::Params as SqliteParams;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::build_result_set as sqlite_build_result_set;

#[cfg(feature = "mysql")]
pub use crate::mysql::MysqlConnection;
#[cfg(feature = "mysql")]
pub use crate::mysql::Params as MysqlParams;
#[cfg(feature = "mysql")]
pub use crate::mysql::build_result_set as mysql_build_result_set;
