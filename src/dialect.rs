//! Dialect resolution for `SQLite` and `MySQL`.
//!
//! Every function here is pure: it maps a `DatabaseType` plus some input to the SQL text
//! or bound value that backend expects. Nothing in this module touches a connection.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqlManagerError;
use crate::types::{DatabaseType, LogicalType, RowValues};

/// Table suffix appended to every `MySQL` `CREATE TABLE`.
pub const MYSQL_TABLE_SUFFIX: &str =
    " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("static regex")
});

/// Native column type for a logical type.
#[must_use]
pub fn ddl_type(db_type: DatabaseType, logical: LogicalType) -> String {
    match (db_type, logical) {
        (_, LogicalType::String(len)) => format!("VARCHAR({len})"),
        (DatabaseType::Sqlite, LogicalType::Integer) => "INTEGER".to_string(),
        (DatabaseType::Mysql, LogicalType::Integer) => "INT".to_string(),
        (DatabaseType::Sqlite, LogicalType::Real) => "REAL".to_string(),
        (DatabaseType::Mysql, LogicalType::Real) => "DOUBLE".to_string(),
        (DatabaseType::Sqlite, LogicalType::Boolean) => "BOOLEAN".to_string(),
        (DatabaseType::Mysql, LogicalType::Boolean) => "TINYINT(1)".to_string(),
        (_, LogicalType::Text) => "TEXT".to_string(),
        (_, LogicalType::Date) => "DATE".to_string(),
        (_, LogicalType::Timestamp) => "TIMESTAMP".to_string(),
    }
}

/// The auto-generated `id` column every table created through the schema builder gets.
#[must_use]
pub fn primary_key_clause(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        DatabaseType::Mysql => "id INT AUTO_INCREMENT PRIMARY KEY",
    }
}

#[must_use]
pub fn table_suffix(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::Sqlite => "",
        DatabaseType::Mysql => MYSQL_TABLE_SUFFIX,
    }
}

/// Encode a value for binding.
///
/// `MySQL` receives booleans as `1`/`0` integers; `SQLite` binds them as-is.
#[must_use]
pub fn bind_value(db_type: DatabaseType, value: &RowValues) -> RowValues {
    match (db_type, value) {
        (DatabaseType::Mysql, RowValues::Bool(b)) => RowValues::Int(i64::from(*b)),
        _ => value.clone(),
    }
}

/// Encode a whole parameter list, preserving order.
#[must_use]
pub fn bind_values(db_type: DatabaseType, values: &[RowValues]) -> Vec<RowValues> {
    values.iter().map(|v| bind_value(db_type, v)).collect()
}

/// Render a value as a SQL literal for use in a `DEFAULT` clause.
#[must_use]
pub fn default_literal(value: &RowValues) -> String {
    match value {
        RowValues::Text(s) => quote_literal(s),
        RowValues::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        RowValues::Int(i) => i.to_string(),
        RowValues::Float(f) if f.is_finite() => f.to_string(),
        RowValues::Float(_) | RowValues::Null => "NULL".to_string(),
        RowValues::Date(d) => quote_literal(&d.format("%Y-%m-%d").to_string()),
        RowValues::Timestamp(ts) => quote_literal(&ts.format("%Y-%m-%d %H:%M:%S").to_string()),
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Reject table and column names that are not plain (optionally qualified) identifiers.
///
/// # Errors
/// Returns `SqlManagerError::ValidationError` for anything else.
pub fn validate_identifier(name: &str) -> Result<(), SqlManagerError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(SqlManagerError::ValidationError(format!(
            "invalid identifier: '{name}'"
        )))
    }
}

/// Query returning one row when the table exists. Binds the table name.
#[must_use]
pub fn table_exists_query(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        DatabaseType::Mysql => {
            "SELECT TABLE_NAME FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?"
        }
    }
}

/// Query listing user tables in the current database, one `name` column per row.
#[must_use]
pub fn list_tables_query(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::Sqlite => {
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
        DatabaseType::Mysql => {
            "SELECT TABLE_NAME AS name FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() ORDER BY TABLE_NAME"
        }
    }
}

/// Column metadata query. Both dialects yield `name`, `type`, `notnull`, `dflt_value`, `pk`.
/// Binds the table name.
#[must_use]
pub fn table_structure_query(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::Sqlite => {
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"
        }
        DatabaseType::Mysql => {
            "SELECT COLUMN_NAME AS name, COLUMN_TYPE AS type, \
             CASE WHEN IS_NULLABLE = 'NO' THEN 1 ELSE 0 END AS `notnull`, \
             COLUMN_DEFAULT AS dflt_value, \
             CASE WHEN COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END AS pk \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION"
        }
    }
}

/// Statements that empty a table and reset its id counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatePlan {
    /// Run before the body.
    pub setup: Vec<String>,
    /// Empties the table.
    pub body: Vec<String>,
    /// `SQLite` only: resets the AUTOINCREMENT counter. Runs only when `sqlite_sequence` exists.
    pub sequence_reset: Option<String>,
    /// Always runs, even when the body failed.
    pub restore: Vec<String>,
}

#[must_use]
pub fn truncate_plan(db_type: DatabaseType, table: &str) -> TruncatePlan {
    match db_type {
        DatabaseType::Sqlite => TruncatePlan {
            setup: Vec::new(),
            body: vec![format!("DELETE FROM {table}")],
            sequence_reset: Some(format!(
                "DELETE FROM sqlite_sequence WHERE name = {}",
                quote_literal(table)
            )),
            restore: Vec::new(),
        },
        DatabaseType::Mysql => TruncatePlan {
            setup: vec!["SET FOREIGN_KEY_CHECKS = 0".to_string()],
            body: vec![format!("TRUNCATE TABLE {table}")],
            sequence_reset: None,
            restore: vec!["SET FOREIGN_KEY_CHECKS = 1".to_string()],
        },
    }
}

#[must_use]
pub fn supports_right_join(db_type: DatabaseType) -> bool {
    matches!(db_type, DatabaseType::Mysql)
}

/// Kind of join appended by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

/// Render a join fragment.
///
/// Without native `RIGHT JOIN` support the join degrades to a `LEFT JOIN` with the
/// `ON` columns swapped.
#[must_use]
pub fn join_clause(
    db_type: DatabaseType,
    kind: JoinKind,
    table: &str,
    left: &str,
    right: &str,
) -> String {
    match kind {
        JoinKind::Inner => format!("INNER JOIN {table} ON {left} = {right}"),
        JoinKind::Left => format!("LEFT JOIN {table} ON {left} = {right}"),
        JoinKind::Right if supports_right_join(db_type) => {
            format!("RIGHT JOIN {table} ON {left} = {right}")
        }
        JoinKind::Right => format!("LEFT JOIN {table} ON {right} = {left}"),
    }
}

/// Statement that creates the target database before connecting to it.
/// `None` for dialects without a server. The name is backtick-quoted, so `my-db` is fine.
#[must_use]
pub fn create_database_statement(db_type: DatabaseType, database: &str) -> Option<String> {
    match db_type {
        DatabaseType::Sqlite => None,
        DatabaseType::Mysql => Some(format!(
            "CREATE DATABASE IF NOT EXISTS `{}`",
            database.replace('`', "``")
        )),
    }
}

/// Health check statement.
pub const PING_QUERY: &str = "SELECT 1";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn ddl_types_per_dialect() {
        let cases = [
            (LogicalType::String(50), "VARCHAR(50)", "VARCHAR(50)"),
            (LogicalType::Integer, "INTEGER", "INT"),
            (LogicalType::Real, "REAL", "DOUBLE"),
            (LogicalType::Boolean, "BOOLEAN", "TINYINT(1)"),
            (LogicalType::Text, "TEXT", "TEXT"),
            (LogicalType::Date, "DATE", "DATE"),
            (LogicalType::Timestamp, "TIMESTAMP", "TIMESTAMP"),
        ];
        for (logical, sqlite, mysql) in cases {
            assert_eq!(ddl_type(DatabaseType::Sqlite, logical), sqlite);
            assert_eq!(ddl_type(DatabaseType::Mysql, logical), mysql);
        }
    }

    #[test]
    fn primary_keys_and_suffixes() {
        assert_eq!(
            primary_key_clause(DatabaseType::Sqlite),
            "id INTEGER PRIMARY KEY AUTOINCREMENT"
        );
        assert_eq!(
            primary_key_clause(DatabaseType::Mysql),
            "id INT AUTO_INCREMENT PRIMARY KEY"
        );
        assert_eq!(table_suffix(DatabaseType::Sqlite), "");
        assert!(table_suffix(DatabaseType::Mysql).contains("utf8mb4_unicode_ci"));
    }

    #[test]
    fn booleans_bind_as_integers_on_mysql() {
        assert_eq!(
            bind_value(DatabaseType::Mysql, &RowValues::Bool(true)),
            RowValues::Int(1)
        );
        assert_eq!(
            bind_value(DatabaseType::Mysql, &RowValues::Bool(false)),
            RowValues::Int(0)
        );
        assert_eq!(
            bind_value(DatabaseType::Sqlite, &RowValues::Bool(true)),
            RowValues::Bool(true)
        );
        assert_eq!(
            bind_value(DatabaseType::Mysql, &RowValues::Text("x".into())),
            RowValues::Text("x".into())
        );
    }

    #[test]
    fn default_literals() {
        let cases = [
            (RowValues::Text("it's".into()), "'it''s'"),
            (RowValues::Bool(true), "1"),
            (RowValues::Bool(false), "0"),
            (RowValues::Int(0), "0"),
            (RowValues::Float(1.5), "1.5"),
            (RowValues::Null, "NULL"),
            (
                RowValues::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
                "'2024-02-29'",
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(default_literal(&value), expected);
        }
    }

    #[test]
    fn identifiers() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("u.name").is_ok());
        assert!(validate_identifier("_tmp1").is_ok());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn truncate_plans() {
        let sqlite = truncate_plan(DatabaseType::Sqlite, "users");
        assert_eq!(sqlite.body, vec!["DELETE FROM users".to_string()]);
        assert_eq!(
            sqlite.sequence_reset.as_deref(),
            Some("DELETE FROM sqlite_sequence WHERE name = 'users'")
        );
        assert!(sqlite.setup.is_empty() && sqlite.restore.is_empty());

        let mysql = truncate_plan(DatabaseType::Mysql, "users");
        assert_eq!(mysql.setup, vec!["SET FOREIGN_KEY_CHECKS = 0".to_string()]);
        assert_eq!(mysql.body, vec!["TRUNCATE TABLE users".to_string()]);
        assert_eq!(mysql.restore, vec!["SET FOREIGN_KEY_CHECKS = 1".to_string()]);
        assert!(mysql.sequence_reset.is_none());
    }

    #[test]
    fn right_join_fallback() {
        assert_eq!(
            join_clause(DatabaseType::Mysql, JoinKind::Right, "orders", "users.id", "orders.user_id"),
            "RIGHT JOIN orders ON users.id = orders.user_id"
        );
        assert_eq!(
            join_clause(DatabaseType::Sqlite, JoinKind::Right, "orders", "users.id", "orders.user_id"),
            "LEFT JOIN orders ON orders.user_id = users.id"
        );
        assert_eq!(
            join_clause(DatabaseType::Sqlite, JoinKind::Inner, "orders", "users.id", "orders.user_id"),
            "INNER JOIN orders ON users.id = orders.user_id"
        );
    }

    #[test]
    fn database_creation_only_for_mysql() {
        assert!(create_database_statement(DatabaseType::Sqlite, "app").is_none());
        assert_eq!(
            create_database_statement(DatabaseType::Mysql, "app").as_deref(),
            Some("CREATE DATABASE IF NOT EXISTS `app`")
        );
        assert_eq!(
            create_database_statement(DatabaseType::Mysql, "my-db").as_deref(),
            Some("CREATE DATABASE IF NOT EXISTS `my-db`")
        );
        assert_eq!(
            create_database_statement(DatabaseType::Mysql, "odd`name").as_deref(),
            Some("CREATE DATABASE IF NOT EXISTS `odd``name`")
        );
    }
}
