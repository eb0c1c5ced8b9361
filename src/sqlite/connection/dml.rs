use crate::error::SqlManagerError;
use crate::executor::DmlOutcome;

use super::{SqliteConnection, run_blocking};

/// True for statements after which `last_insert_rowid` describes this statement's row.
pub(crate) fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("insert"))
}

pub(crate) fn execute_dml_sync(
    guard: &rusqlite::Connection,
    sql: &str,
    params: &[rusqlite::types::Value],
) -> Result<DmlOutcome, SqlManagerError> {
    let mut stmt = guard.prepare_cached(sql)?;
    let rows_affected = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
    drop(stmt);
    let last_insert_id = (rows_affected > 0 && is_insert(sql)).then(|| guard.last_insert_rowid());
    Ok(DmlOutcome {
        rows_affected,
        last_insert_id,
    })
}

impl SqliteConnection {
    /// Execute one or more statements without parameters (auto-commit).
    ///
    /// # Errors
    /// Returns `SqlManagerError` if `SQLite` rejects any statement in the batch.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlManagerError> {
        let sql_owned = query.to_owned();
        run_blocking(self.conn_handle(), move |guard| {
            guard.execute_batch(&sql_owned)?;
            Ok(())
        })
        .await
    }

    /// Execute a DML statement and report rows affected and the generated rowid.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if preparing or executing the statement fails.
    pub async fn execute_dml(
        &self,
        query: &str,
        params: &[rusqlite::types::Value],
    ) -> Result<DmlOutcome, SqlManagerError> {
        let sql_owned = query.to_owned();
        let params_owned = params.to_vec();
        run_blocking(self.conn_handle(), move |guard| {
            execute_dml_sync(guard, &sql_owned, &params_owned)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::is_insert;

    #[test]
    fn detects_inserts() {
        assert!(is_insert("INSERT INTO t (a) VALUES (?)"));
        assert!(is_insert("  insert into t default values"));
        assert!(!is_insert("UPDATE t SET a = 1"));
        assert!(!is_insert("INS"));
    }
}
