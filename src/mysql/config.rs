use mysql_async::{Conn, OptsBuilder};
use tracing::{debug, warn};

use crate::config::MysqlOptions;
use crate::dialect::create_database_statement;
use crate::error::SqlManagerError;
use crate::types::DatabaseType;

use super::connection::MysqlConnection;

/// Convert options to a mysql_async `OptsBuilder`.
///
/// `with_database = false` yields a server-level connection, used to create the database.
#[must_use]
pub fn opts_builder(opts: &MysqlOptions, with_database: bool) -> OptsBuilder {
    let builder = OptsBuilder::default()
        .ip_or_hostname(opts.host.clone())
        .tcp_port(opts.port)
        .user(Some(opts.user.clone()))
        .pass(opts.password.clone())
        .prefer_socket(false)
        .init(opts.init_statements.clone());
    if with_database {
        builder.db_name(Some(opts.database.clone()))
    } else {
        builder
    }
}

/// Make sure the target database exists. Failure is logged and otherwise ignored; the
/// real connection attempt that follows reports anything fatal.
pub async fn ensure_database(opts: &MysqlOptions) {
    let Some(stmt) = create_database_statement(DatabaseType::Mysql, &opts.database) else {
        return;
    };
    match Conn::new(opts_builder(opts, false)).await {
        Ok(server) => {
            let mut server = MysqlConnection::new(server);
            if let Err(e) = server.execute_batch(&stmt).await {
                warn!(database = %opts.database, error = %e, "could not create database");
            }
            if let Err(e) = server.close().await {
                debug!(error = %e, "server connection did not close cleanly");
            }
        }
        Err(e) => {
            warn!(host = %opts.host, error = %e, "server connection for database creation failed");
        }
    }
}

/// Create the database if needed, then open the working connection.
///
/// # Errors
/// Returns `SqlManagerError::ConnectionError` if the server cannot be reached.
pub async fn open(opts: &MysqlOptions) -> Result<MysqlConnection, SqlManagerError> {
    ensure_database(opts).await;
    let conn = Conn::new(opts_builder(opts, true)).await.map_err(|e| {
        SqlManagerError::ConnectionError(format!(
            "failed to connect to MySQL {}:{}/{}: {e}",
            opts.host, opts.port, opts.database
        ))
    })?;
    debug!(host = %opts.host, port = opts.port, database = %opts.database, "connected to MySQL");
    Ok(MysqlConnection::new(conn))
}
