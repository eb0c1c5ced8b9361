use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::{
    DbConfig, MysqlOptions, MysqlOptionsBuilder, SqliteOptions, SqliteOptionsBuilder,
};
use crate::connection::DbConnection;
use crate::dialect::{
    list_tables_query, table_exists_query, table_structure_query, truncate_plan,
    validate_identifier,
};
use crate::dml::{InsertBuilder, UpdateBuilder};
use crate::error::SqlManagerError;
use crate::executor::{AsyncDatabaseExecutor, CompiledQuery, DmlOutcome};
use crate::query_builder::QueryBuilder;
use crate::results::{CustomDbRow, ResultSet};
use crate::schema::{TableBuilder, TableSchema};
use crate::types::{DatabaseType, LogicalType, RowValues};

/// Returned by `InsertBuilder::execute` when the backend generated no key.
pub const NO_GENERATED_ID: i64 = -1;

/// Lifecycle of the handle's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or the last connect attempt failed.
    Disconnected,
    Connected,
    /// Failed a health check; the next operation reconnects.
    Stale,
    /// `close()` ran. Terminal.
    Closed,
}

/// One column as reported by table introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Native type as the backend reports it (`VARCHAR(50)`, `int`, ...).
    pub data_type: String,
    /// `None` when the native type has no logical counterpart.
    pub logical_type: Option<LogicalType>,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

struct Slot {
    conn: Option<DbConnection>,
    state: ConnectionState,
}

struct Inner {
    config: DbConfig,
    slot: AsyncMutex<Slot>,
    schemas: RwLock<HashMap<String, Arc<TableSchema>>>,
    current_row: Mutex<Option<CustomDbRow>>,
    tracker: TaskTracker,
    // runtime the handle was built on, if any
    runtime: Option<Handle>,
}

/// Handle to one database.
///
/// Cloning is cheap and every clone shares the same connection, schema registry and
/// current row. Construction never connects; the first operation (or `connect()`) does.
/// Operations on one handle are serialized on its single connection; create separate
/// handles for independent connections.
#[derive(Clone)]
pub struct DbManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for DbManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbManager")
            .field("db_type", &self.db_type())
            .finish_non_exhaustive()
    }
}

fn closed_error() -> SqlManagerError {
    SqlManagerError::ConnectionError("database manager is closed".to_string())
}

impl DbManager {
    #[must_use]
    pub fn new(config: DbConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                slot: AsyncMutex::new(Slot {
                    conn: None,
                    state: ConnectionState::Disconnected,
                }),
                schemas: RwLock::new(HashMap::new()),
                current_row: Mutex::new(None),
                tracker: TaskTracker::new(),
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    #[must_use]
    pub fn sqlite(opts: SqliteOptions) -> Self {
        Self::new(DbConfig::Sqlite(opts))
    }

    #[must_use]
    pub fn mysql(opts: MysqlOptions) -> Self {
        Self::new(DbConfig::Mysql(opts))
    }

    #[must_use]
    pub fn sqlite_builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn mysql_builder(database: impl Into<String>, user: impl Into<String>) -> MysqlOptionsBuilder {
        MysqlOptionsBuilder::new(database, user)
    }

    /// # Errors
    /// Returns `SqlManagerError::ConfigError` for unsupported or malformed URLs.
    pub fn from_url(url: &str) -> Result<Self, SqlManagerError> {
        DbConfig::from_url(url).map(Self::new)
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.inner.config.db_type()
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.inner.tracker
    }

    /// The caller's runtime, else the one this handle was built on.
    pub(crate) fn runtime(&self) -> Option<Handle> {
        Handle::try_current().ok().or_else(|| self.inner.runtime.clone())
    }

    /// Open the connection if there is none.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ConnectionError` if the backend cannot be reached or the
    /// handle is closed.
    pub async fn connect(&self) -> Result<(), SqlManagerError> {
        let mut slot = self.inner.slot.lock().await;
        match slot.state {
            ConnectionState::Closed => Err(closed_error()),
            ConnectionState::Connected if slot.conn.is_some() => Ok(()),
            _ => self.reopen(&mut slot).await,
        }
    }

    /// Close the current connection (if any) and open a fresh one.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ConnectionError` if the new connection cannot be opened.
    pub async fn reconnect(&self) -> Result<(), SqlManagerError> {
        let mut slot = self.inner.slot.lock().await;
        if slot.state == ConnectionState::Closed {
            return Err(closed_error());
        }
        self.reopen(&mut slot).await
    }

    async fn reopen(&self, slot: &mut Slot) -> Result<(), SqlManagerError> {
        if let Some(old) = slot.conn.take() {
            if let Err(e) = old.close().await {
                debug!(error = %e, "previous connection did not close cleanly");
            }
        }
        match DbConnection::open(&self.inner.config).await {
            Ok(conn) => {
                slot.conn = Some(conn);
                slot.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                if slot.state == ConnectionState::Connected {
                    slot.state = ConnectionState::Stale;
                }
                Err(match e {
                    SqlManagerError::ConnectionError(_) | SqlManagerError::Unimplemented(_) => e,
                    other => SqlManagerError::ConnectionError(other.to_string()),
                })
            }
        }
    }

    /// Health-check the connection, reconnecting when it is missing or unhealthy.
    async fn ensure_locked<'s>(
        &self,
        slot: &'s mut Slot,
    ) -> Result<&'s mut DbConnection, SqlManagerError> {
        if slot.state == ConnectionState::Closed {
            return Err(closed_error());
        }
        let healthy = match slot.conn.as_mut() {
            Some(conn) => match conn.ping().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "connection failed health check, reconnecting");
                    slot.state = ConnectionState::Stale;
                    false
                }
            },
            None => false,
        };
        if !healthy {
            self.reopen(slot).await?;
        }
        slot.conn
            .as_mut()
            .ok_or_else(|| SqlManagerError::ConnectionError("no connection available".to_string()))
    }

    /// Make sure a healthy connection is open.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ConnectionError` if reconnecting fails or the handle is closed.
    pub async fn ensure_connection(&self) -> Result<(), SqlManagerError> {
        let mut slot = self.inner.slot.lock().await;
        self.ensure_locked(&mut slot).await.map(|_| ())
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.slot.lock().await.state
    }

    pub async fn is_connected(&self) -> bool {
        let slot = self.inner.slot.lock().await;
        slot.state == ConnectionState::Connected && slot.conn.is_some()
    }

    /// Stop accepting background work, wait for what is in flight, then close the
    /// connection. Later calls are no-ops; later operations fail with `ConnectionError`.
    ///
    /// Do not call this from inside a submitted operation: it waits for that operation.
    ///
    /// # Errors
    /// Returns the backend's close error.
    pub async fn close(&self) -> Result<(), SqlManagerError> {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;

        let mut slot = self.inner.slot.lock().await;
        if slot.state == ConnectionState::Closed {
            return Ok(());
        }
        slot.state = ConnectionState::Closed;
        let conn = slot.conn.take();
        drop(slot);
        info!(db_type = %self.db_type(), "closing database manager");
        match conn {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }

    /// Run a SELECT through the connection chokepoint.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the connection is unavailable or the statement fails.
    pub async fn query_rows(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlManagerError> {
        let mut slot = self.inner.slot.lock().await;
        let conn = self.ensure_locked(&mut slot).await?;
        conn.execute_select(sql, params).await
    }

    /// Run a DML statement through the connection chokepoint.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the connection is unavailable or the statement fails.
    pub async fn execute_dml(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<DmlOutcome, SqlManagerError> {
        let mut slot = self.inner.slot.lock().await;
        let conn = self.ensure_locked(&mut slot).await?;
        conn.execute_dml(sql, params).await
    }

    /// Run parameterless statements (DDL, pragmas, session settings).
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the connection is unavailable or the batch fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlManagerError> {
        let mut slot = self.inner.slot.lock().await;
        let conn = self.ensure_locked(&mut slot).await?;
        conn.execute_batch(sql).await
    }

    pub(crate) async fn run_in_transaction(
        &self,
        statements: Vec<CompiledQuery>,
    ) -> Result<usize, SqlManagerError> {
        let mut slot = self.inner.slot.lock().await;
        let conn = self.ensure_locked(&mut slot).await?;
        conn.run_in_transaction(statements).await
    }

    /// Run a raw parameterized DML statement and return rows affected.
    ///
    /// # Errors
    /// Returns `SqlManagerError::StatementError` if the backend rejects it.
    pub async fn execute_update(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlManagerError> {
        Ok(self.execute_dml(sql, params).await?.rows_affected)
    }

    /// Pick the statement written for this handle's dialect.
    #[must_use]
    pub fn dialect_query<'a>(&self, sqlite_sql: &'a str, mysql_sql: &'a str) -> &'a str {
        match self.db_type() {
            DatabaseType::Sqlite => sqlite_sql,
            DatabaseType::Mysql => mysql_sql,
        }
    }

    /// # Errors
    /// Returns `SqlManagerError` if the lookup fails.
    pub async fn table_exists(&self, table: &str) -> Result<bool, SqlManagerError> {
        let rows = self
            .query_rows(
                table_exists_query(self.db_type()),
                &[RowValues::Text(table.to_string())],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// User tables in the current database, sorted by name.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the lookup fails.
    pub async fn get_tables(&self) -> Result<Vec<String>, SqlManagerError> {
        let rows = self.query_rows(list_tables_query(self.db_type()), &[]).await?;
        Ok(rows
            .results
            .iter()
            .map(|row| row.get_string("name", ""))
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// Column metadata in declaration order. Empty when the table does not exist.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the lookup fails.
    pub async fn get_table_structure(&self, table: &str) -> Result<Vec<ColumnInfo>, SqlManagerError> {
        let rows = self
            .query_rows(
                table_structure_query(self.db_type()),
                &[RowValues::Text(table.to_string())],
            )
            .await?;
        Ok(rows
            .results
            .iter()
            .map(|row| {
                let data_type = row.get_string("type", "");
                ColumnInfo {
                    name: row.get_string("name", ""),
                    logical_type: LogicalType::parse(&data_type).ok(),
                    data_type,
                    not_null: row.get_bool("notnull", false),
                    default_value: row
                        .get("dflt_value")
                        .filter(|v| !v.is_null())
                        .map(ToString::to_string),
                    primary_key: row.get_bool("pk", false),
                }
            })
            .collect())
    }

    /// Remove every row and reset the table's id counter.
    ///
    /// On `MySQL` foreign-key checks are disabled around the `TRUNCATE` and re-enabled even
    /// when it fails.
    ///
    /// # Errors
    /// Returns `SqlManagerError` for an invalid table name or a failed statement.
    pub async fn truncate_table(&self, table: &str) -> Result<(), SqlManagerError> {
        validate_identifier(table)?;
        let plan = truncate_plan(self.db_type(), table);

        let mut slot = self.inner.slot.lock().await;
        let conn = self.ensure_locked(&mut slot).await?;

        let mut result = Ok(());
        for stmt in &plan.setup {
            result = conn.execute_batch(stmt).await;
            if result.is_err() {
                break;
            }
        }
        if result.is_ok() {
            for stmt in &plan.body {
                result = conn.execute_dml(stmt, &[]).await.map(|_| ());
                if result.is_err() {
                    break;
                }
            }
        }
        if result.is_ok() {
            if let Some(reset) = &plan.sequence_reset {
                let probe = conn
                    .execute_select(
                        table_exists_query(self.db_type()),
                        &[RowValues::Text("sqlite_sequence".to_string())],
                    )
                    .await;
                result = match probe {
                    Ok(rows) if rows.is_empty() => Ok(()),
                    Ok(_) => conn.execute_dml(reset, &[]).await.map(|_| ()),
                    Err(e) => Err(e),
                };
            }
        }
        for stmt in &plan.restore {
            if let Err(e) = conn.execute_batch(stmt).await {
                warn!(sql = %stmt, error = %e, "restore statement failed after truncate");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        if result.is_ok() {
            info!(table = %table, "table truncated");
        }
        result
    }

    /// Load the row with the given `id` as the current row.
    ///
    /// Returns `Ok(false)` when no row matched; the current row is left as it was.
    ///
    /// # Errors
    /// Returns `SqlManagerError` for an invalid table name or a failed query.
    pub async fn select(&self, table: &str, id: i64) -> Result<bool, SqlManagerError> {
        validate_identifier(table)?;
        let sql = format!("SELECT * FROM {table} WHERE id = ?");
        let rows = self.query_rows(&sql, &[RowValues::Int(id)]).await?;
        match rows.into_rows().into_iter().next() {
            Some(row) => {
                self.set_current_row(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn set_current_row(&self, row: CustomDbRow) {
        let mut guard = match self.inner.current_row.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(row);
    }

    /// The last row loaded by `select` or `QueryBuilder::first`.
    #[must_use]
    pub fn current_row(&self) -> Option<CustomDbRow> {
        match self.inner.current_row.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear_values(&self) {
        let mut guard = match self.inner.current_row.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }

    #[must_use]
    pub fn get_string(&self, column: &str, default: &str) -> String {
        self.current_row()
            .map_or_else(|| default.to_string(), |row| row.get_string(column, default))
    }

    #[must_use]
    pub fn get_int(&self, column: &str, default: i32) -> i32 {
        self.current_row()
            .map_or(default, |row| row.get_int(column, default))
    }

    #[must_use]
    pub fn get_long(&self, column: &str, default: i64) -> i64 {
        self.current_row()
            .map_or(default, |row| row.get_long(column, default))
    }

    #[must_use]
    pub fn get_double(&self, column: &str, default: f64) -> f64 {
        self.current_row()
            .map_or(default, |row| row.get_double(column, default))
    }

    #[must_use]
    pub fn get_boolean(&self, column: &str, default: bool) -> bool {
        self.current_row()
            .map_or(default, |row| row.get_bool(column, default))
    }

    pub(crate) fn register_schema(&self, schema: Arc<TableSchema>) {
        let mut guard = match self.inner.schemas.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(schema.name.clone(), schema);
    }

    /// Schema registered when the table was created through this handle.
    #[must_use]
    pub fn schema(&self, table: &str) -> Option<Arc<TableSchema>> {
        let guard = match self.inner.schemas.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(table).cloned()
    }

    #[must_use]
    pub fn create_table(&self, name: &str) -> TableBuilder {
        TableBuilder::new(self.clone(), name)
    }

    #[must_use]
    pub fn insert(&self, table: &str) -> InsertBuilder {
        InsertBuilder::new(self.clone(), table)
    }

    #[must_use]
    pub fn update(&self, table: &str) -> UpdateBuilder {
        UpdateBuilder::new(self.clone(), table)
    }

    #[must_use]
    pub fn query(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.clone(), table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_query_picks_by_backend() {
        let sqlite = DbManager::sqlite(SqliteOptions::new(":memory:"));
        let mysql = DbManager::mysql(MysqlOptions::new("localhost", 3306, "app", "root", None));
        assert_eq!(sqlite.dialect_query("A", "B"), "A");
        assert_eq!(mysql.dialect_query("A", "B"), "B");
    }

    #[test]
    fn current_row_accessors_default_without_a_row() {
        let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
        assert_eq!(db.get_string("username", "none"), "none");
        assert_eq!(db.get_int("loginCount", 5), 5);
        assert!(!db.get_boolean("active", false));
        assert!(db.current_row().is_none());
    }

    #[test]
    fn construction_does_not_connect() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let db = DbManager::mysql(MysqlOptions::new("127.0.0.1", 1, "nope", "root", None));
            assert_eq!(db.state().await, ConnectionState::Disconnected);
            assert!(!db.is_connected().await);
        });
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn failed_connect_reports_connection_error_and_stays_retryable() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let db = DbManager::mysql(MysqlOptions::new("127.0.0.1", 1, "nope", "root", None));
            let err = db.ensure_connection().await.unwrap_err();
            assert!(matches!(err, SqlManagerError::ConnectionError(_)), "{err:?}");
            assert_eq!(db.state().await, ConnectionState::Disconnected);

            // not closed, so the next call tries again
            let err = db.query("users").count().await.unwrap_err();
            assert!(err.is_connection_error());
            assert_eq!(db.state().await, ConnectionState::Disconnected);
        });
    }
}
