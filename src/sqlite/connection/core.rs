use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::dialect::PING_QUERY;
use crate::error::SqlManagerError;

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// A single `rusqlite` connection shared with the blocking thread pool.
pub struct SqliteConnection {
    conn: SharedSqliteConnection,
}

impl SqliteConnection {
    pub(crate) fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub(crate) fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&self.conn)
    }

    /// Health check.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the trivial query fails.
    pub async fn ping(&self) -> Result<(), SqlManagerError> {
        run_blocking(self.conn_handle(), |guard| {
            guard.query_row(PING_QUERY, [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    /// Close the underlying handle, surfacing any error `SQLite` reports.
    ///
    /// # Errors
    /// Returns `SqlManagerError::SqliteError` if `sqlite3_close` fails.
    pub async fn close(self) -> Result<(), SqlManagerError> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex.into_inner();
                tokio::task::spawn_blocking(move || conn.close().map_err(|(_, e)| SqlManagerError::from(e)))
                    .await
                    .map_err(|e| {
                        SqlManagerError::ConnectionError(format!(
                            "sqlite spawn_blocking join error: {e}"
                        ))
                    })?
            }
            // another clone is still in flight; the last one drops the handle
            Err(_) => Ok(()),
        }
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlManagerError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlManagerError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlManagerError::ConnectionError(format!("sqlite spawn_blocking join error: {e}")))?
}
