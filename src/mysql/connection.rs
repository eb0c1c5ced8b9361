use mysql_async::prelude::*;
use mysql_async::{Conn, Row};
use tracing::{debug, warn};

use crate::dialect::PING_QUERY;
use crate::error::SqlManagerError;
use crate::executor::DmlOutcome;
use crate::results::ResultSet;

use super::params::Params;
use super::query::build_result_set;

/// A single `MySQL` connection.
pub struct MysqlConnection {
    conn: Conn,
}

impl std::fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("id", &self.conn.id())
            .finish()
    }
}

impl MysqlConnection {
    pub(crate) fn new(conn: Conn) -> Self {
        Self { conn }
    }

    /// Execute statements over the text protocol, no parameters.
    ///
    /// # Errors
    /// Returns `SqlManagerError::MysqlError` if the server rejects the batch.
    pub async fn execute_batch(&mut self, query: &str) -> Result<(), SqlManagerError> {
        debug!(sql = %query, "executing batch");
        self.conn.query_drop(query).await?;
        Ok(())
    }

    /// Execute a SELECT with positional parameters.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if conversion or execution fails.
    pub async fn execute_select(
        &mut self,
        query: &str,
        params: Params,
    ) -> Result<ResultSet, SqlManagerError> {
        let rows: Vec<Row> = self.conn.exec(query, params.0).await?;
        Ok(build_result_set(rows))
    }

    /// Execute a DML statement and report rows affected and the generated id.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if execution fails.
    pub async fn execute_dml(
        &mut self,
        query: &str,
        params: Params,
    ) -> Result<DmlOutcome, SqlManagerError> {
        self.conn.exec_drop(query, params.0).await?;
        let rows_affected = usize::try_from(self.conn.affected_rows()).map_err(|e| {
            SqlManagerError::StatementError {
                sql: query.to_string(),
                message: format!("rows affected out of range: {e}"),
            }
        })?;
        let last_insert_id = self
            .conn
            .last_insert_id()
            .filter(|id| *id != 0)
            .and_then(|id| i64::try_from(id).ok());
        Ok(DmlOutcome {
            rows_affected,
            last_insert_id,
        })
    }

    /// Health check.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the round trip fails.
    pub async fn ping(&mut self) -> Result<(), SqlManagerError> {
        self.conn.query_drop(PING_QUERY).await?;
        Ok(())
    }

    /// Run the statements in one transaction, restoring the session's prior auto-commit mode
    /// afterwards whether or not they succeed.
    ///
    /// # Errors
    /// Returns the first statement error after rolling back.
    pub async fn run_in_transaction(
        &mut self,
        statements: Vec<(String, Params)>,
    ) -> Result<usize, SqlManagerError> {
        let prior: Option<i64> = self.conn.query_first("SELECT @@autocommit").await?;
        let prior = prior.unwrap_or(1);
        self.conn.query_drop("SET autocommit = 0").await?;

        let outcome = self.run_statements(statements).await;
        let finish = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };
        let finished = self.conn.query_drop(finish).await;
        let restore = format!("SET autocommit = {prior}");
        if let Err(e) = self.conn.query_drop(restore.as_str()).await {
            warn!(error = %e, "could not restore autocommit");
        }

        let total = outcome?;
        finished?;
        Ok(total)
    }

    async fn run_statements(
        &mut self,
        statements: Vec<(String, Params)>,
    ) -> Result<usize, SqlManagerError> {
        let mut total = 0usize;
        for (sql, params) in statements {
            let outcome = self
                .execute_dml(&sql, params)
                .await
                .map_err(|e| SqlManagerError::statement(&sql, e))?;
            total += outcome.rows_affected;
        }
        Ok(total)
    }

    /// Disconnect gracefully.
    ///
    /// # Errors
    /// Returns `SqlManagerError::MysqlError` if the server does not acknowledge.
    pub async fn close(self) -> Result<(), SqlManagerError> {
        self.conn.disconnect().await?;
        Ok(())
    }
}
