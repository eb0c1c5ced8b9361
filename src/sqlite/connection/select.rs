use crate::error::SqlManagerError;
use crate::results::ResultSet;

use super::{SqliteConnection, run_blocking};
use crate::sqlite::query::build_result_set;

impl SqliteConnection {
    /// Execute a SELECT and materialize it into a `ResultSet`.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if preparing or executing the query fails.
    pub async fn execute_select(
        &self,
        query: &str,
        params: &[rusqlite::types::Value],
    ) -> Result<ResultSet, SqlManagerError> {
        let sql_owned = query.to_owned();
        let params_owned = params.to_vec();
        run_blocking(self.conn_handle(), move |guard| {
            let mut stmt = guard.prepare(&sql_owned)?;
            build_result_set(&mut stmt, &params_owned)
        })
        .await
    }
}
