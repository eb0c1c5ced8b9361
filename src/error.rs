use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlManagerError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MysqlError(#[from] mysql_async::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("Statement failed: {message} (sql: {sql})")]
    StatementError { sql: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl SqlManagerError {
    /// Wrap a backend failure together with the statement that triggered it.
    ///
    /// Connection-level failures keep their variant so callers can tell a dead
    /// connection apart from rejected SQL.
    #[must_use]
    pub fn statement(sql: &str, err: SqlManagerError) -> Self {
        match err {
            SqlManagerError::ConnectionError(_)
            | SqlManagerError::StatementError { .. }
            | SqlManagerError::ValidationError(_) => err,
            other => SqlManagerError::StatementError {
                sql: sql.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// True when the error means the connection itself is unusable.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SqlManagerError::ConnectionError(_))
    }
}

/// Convenience alias used across the crate.
pub type SqlResult<T> = Result<T, SqlManagerError>;
