use async_trait::async_trait;
use tracing::debug;

use crate::connection::DbConnection;
use crate::conversion::convert_sql_params;
use crate::dialect::bind_values;
use crate::error::SqlManagerError;
use crate::results::ResultSet;
use crate::types::RowValues;

#[cfg(feature = "mysql")]
use crate::mysql;
#[cfg(feature = "sqlite")]
use crate::sqlite;

use super::{CompiledQuery, DmlOutcome};

/// Statement execution against one backend connection.
///
/// Parameters are bound positionally after the dialect's value encoding. Backend failures
/// come back as `StatementError` carrying the offending SQL.
#[async_trait]
pub trait AsyncDatabaseExecutor {
    /// Executes one or more statements without parameters.
    async fn execute_batch(&mut self, query: &str) -> Result<(), SqlManagerError>;

    /// Executes a single SELECT statement and returns the result set.
    async fn execute_select(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlManagerError>;

    /// Executes a single DML statement (INSERT, UPDATE, DELETE, etc.).
    async fn execute_dml(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<DmlOutcome, SqlManagerError>;

    /// Cheap round trip used by the reconnect logic.
    async fn ping(&mut self) -> Result<(), SqlManagerError>;

    /// Executes all statements in one transaction and returns the summed rows affected.
    async fn run_in_transaction(
        &mut self,
        statements: Vec<CompiledQuery>,
    ) -> Result<usize, SqlManagerError>;
}

#[async_trait]
impl AsyncDatabaseExecutor for DbConnection {
    async fn execute_batch(&mut self, query: &str) -> Result<(), SqlManagerError> {
        debug!(sql = %query, "execute batch");
        let result = match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.execute_batch(query).await,
            #[cfg(feature = "mysql")]
            DbConnection::Mysql(conn) => conn.execute_batch(query).await,
        };
        result.map_err(|e| SqlManagerError::statement(query, e))
    }

    async fn execute_select(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlManagerError> {
        debug!(sql = %query, params = params.len(), "execute select");
        let bound = bind_values(self.db_type(), params);
        let result = match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => {
                match convert_sql_params::<sqlite::Params>(&bound) {
                    Ok(converted) => conn.execute_select(query, converted.as_values()).await,
                    Err(e) => Err(e),
                }
            }
            #[cfg(feature = "mysql")]
            DbConnection::Mysql(conn) => {
                match convert_sql_params::<mysql::Params>(&bound) {
                    Ok(converted) => conn.execute_select(query, converted).await,
                    Err(e) => Err(e),
                }
            }
        };
        result.map_err(|e| SqlManagerError::statement(query, e))
    }

    async fn execute_dml(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<DmlOutcome, SqlManagerError> {
        debug!(sql = %query, params = params.len(), "execute dml");
        let bound = bind_values(self.db_type(), params);
        let result = match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => {
                match convert_sql_params::<sqlite::Params>(&bound) {
                    Ok(converted) => conn.execute_dml(query, converted.as_values()).await,
                    Err(e) => Err(e),
                }
            }
            #[cfg(feature = "mysql")]
            DbConnection::Mysql(conn) => {
                match convert_sql_params::<mysql::Params>(&bound) {
                    Ok(converted) => conn.execute_dml(query, converted).await,
                    Err(e) => Err(e),
                }
            }
        };
        result.map_err(|e| SqlManagerError::statement(query, e))
    }

    async fn ping(&mut self) -> Result<(), SqlManagerError> {
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.ping().await,
            #[cfg(feature = "mysql")]
            DbConnection::Mysql(conn) => conn.ping().await,
        }
    }

    async fn run_in_transaction(
        &mut self,
        statements: Vec<CompiledQuery>,
    ) -> Result<usize, SqlManagerError> {
        debug!(statements = statements.len(), "run in transaction");
        let db_type = self.db_type();
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => {
                let converted = statements
                    .into_iter()
                    .map(|stmt| {
                        convert_sql_params::<sqlite::Params>(&bind_values(db_type, &stmt.params))
                        .map(|p| (stmt.sql, p.0))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                conn.run_in_transaction(converted).await
            }
            #[cfg(feature = "mysql")]
            DbConnection::Mysql(conn) => {
                let converted = statements
                    .into_iter()
                    .map(|stmt| {
                        convert_sql_params::<mysql::Params>(&bind_values(db_type, &stmt.params))
                        .map(|p| (stmt.sql, p))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                conn.run_in_transaction(converted).await
            }
        }
    }
}
