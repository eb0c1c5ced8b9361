use tracing::debug;

use crate::config::SqliteOptions;
use crate::error::SqlManagerError;

use super::connection::SqliteConnection;

/// Open the database file described by `opts` off the async runtime.
///
/// # Errors
/// Returns `SqlManagerError::ConnectionError` if the file cannot be opened or the
/// journal pragma fails.
pub async fn open(opts: &SqliteOptions) -> Result<SqliteConnection, SqlManagerError> {
    let db_path = opts.db_path.clone();
    let wal = opts.wal && !opts.is_memory();
    let conn = tokio::task::spawn_blocking(move || -> Result<rusqlite::Connection, SqlManagerError> {
        let conn = rusqlite::Connection::open(&db_path).map_err(|e| {
            SqlManagerError::ConnectionError(format!("failed to open SQLite database {db_path}: {e}"))
        })?;
        if wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;").map_err(|e| {
                SqlManagerError::ConnectionError(format!("failed to enable WAL on {db_path}: {e}"))
            })?;
        }
        Ok(conn)
    })
    .await
    .map_err(|e| {
        SqlManagerError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
    })??;
    debug!(db_path = %opts.db_path, wal, "opened SQLite database");
    Ok(SqliteConnection::new(conn))
}
