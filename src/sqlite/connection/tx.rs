use tracing::warn;

use crate::error::SqlManagerError;

use super::dml::execute_dml_sync;
use super::{SqliteConnection, run_blocking};

impl SqliteConnection {
    /// Run every statement inside one transaction and return the summed rows affected.
    ///
    /// When the connection is already inside a transaction the statements join it and the
    /// caller keeps control of commit; otherwise this commits on success and rolls back on
    /// failure, leaving the connection in auto-commit mode either way.
    ///
    /// # Errors
    /// Returns the first statement error, after rolling back.
    pub async fn run_in_transaction(
        &self,
        statements: Vec<(String, Vec<rusqlite::types::Value>)>,
    ) -> Result<usize, SqlManagerError> {
        run_blocking(self.conn_handle(), move |guard| {
            let owns_tx = guard.is_autocommit();
            if owns_tx {
                guard.execute_batch("BEGIN")?;
            }
            let mut total = 0usize;
            for (sql, params) in &statements {
                match execute_dml_sync(guard, sql, params) {
                    Ok(outcome) => total += outcome.rows_affected,
                    Err(err) => {
                        if owns_tx {
                            if let Err(rollback_err) = guard.execute_batch("ROLLBACK") {
                                warn!(error = %rollback_err, "sqlite rollback failed");
                            }
                        }
                        return Err(SqlManagerError::statement(sql, err));
                    }
                }
            }
            if owns_tx {
                guard.execute_batch("COMMIT")?;
            }
            Ok(total)
        })
        .await
    }
}
