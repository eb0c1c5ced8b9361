use tracing::info;

use crate::config::DbConfig;
use crate::error::SqlManagerError;
#[cfg(feature = "mysql")]
use crate::mysql::MysqlConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;
use crate::types::DatabaseType;

/// A live backend connection.
#[derive(Debug)]
pub enum DbConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "mysql")]
    Mysql(MysqlConnection),
}

impl DbConnection {
    /// Open a connection for the configured backend.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ConnectionError` when the backend is unreachable and
    /// `SqlManagerError::Unimplemented` when its feature is disabled.
    pub async fn open(config: &DbConfig) -> Result<Self, SqlManagerError> {
        let conn = match config {
            #[cfg(feature = "sqlite")]
            DbConfig::Sqlite(opts) => DbConnection::Sqlite(crate::sqlite::config::open(opts).await?),
            #[cfg(feature = "mysql")]
            DbConfig::Mysql(opts) => DbConnection::Mysql(crate::mysql::config::open(opts).await?),
            #[allow(unreachable_patterns)]
            other => {
                return Err(SqlManagerError::Unimplemented(format!(
                    "{} support is not enabled in this build",
                    other.db_type()
                )));
            }
        };
        info!(db_type = %config.db_type(), "database connection opened");
        Ok(conn)
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "mysql")]
            DbConnection::Mysql(_) => DatabaseType::Mysql,
        }
    }

    /// Close the connection.
    ///
    /// # Errors
    /// Returns the backend's close error.
    pub async fn close(self) -> Result<(), SqlManagerError> {
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.close().await,
            #[cfg(feature = "mysql")]
            DbConnection::Mysql(conn) => conn.close().await,
        }
    }
}
