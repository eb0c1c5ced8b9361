use tracing::debug;

use crate::background::{Completion, CompletionHandler};
use crate::error::SqlManagerError;
use crate::executor::CompiledQuery;
use crate::manager::{DbManager, NO_GENERATED_ID};

use super::{StageValues, StagedValues, validate_columns};

/// Fluent single-row INSERT.
///
/// Columns left unset that declare a default in the registered schema are filled in
/// before the statement is compiled.
///
/// ```rust,no_run
/// use sql_manager::prelude::*;
///
/// # async fn demo(db: DbManager) -> Result<(), SqlManagerError> {
/// let id = db
///     .insert("users")
///     .set_string("username", "johndoe")
///     .set_boolean("active", true)
///     .set_double("money", 100.5)
///     .execute()
///     .await?;
/// assert!(id > 0);
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    manager: DbManager,
    table: String,
    values: StagedValues,
    last_insert_id: i64,
}

impl StageValues for InsertBuilder {
    fn staged_mut(&mut self) -> &mut StagedValues {
        &mut self.values
    }
}

impl InsertBuilder {
    pub(crate) fn new(manager: DbManager, table: &str) -> Self {
        Self {
            manager,
            table: table.to_string(),
            values: StagedValues::new(),
            last_insert_id: NO_GENERATED_ID,
        }
    }

    #[must_use]
    pub fn values(&self) -> &StagedValues {
        &self.values
    }

    /// Compile the INSERT: staged columns first, then any defaulted columns in schema order.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ValidationError` for bad identifiers or when nothing would
    /// be inserted.
    pub fn compile(&self) -> Result<CompiledQuery, SqlManagerError> {
        let mut row = self.values.clone();
        if let Some(schema) = self.manager.schema(&self.table) {
            for (column, default) in schema.defaults() {
                if !row.contains_key(column) {
                    row.insert(column.to_string(), default.clone());
                }
            }
        }
        if row.is_empty() {
            return Err(SqlManagerError::ValidationError(format!(
                "insert into {} has no values",
                self.table
            )));
        }
        validate_columns(&self.table, row.keys())?;

        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table,
            columns.join(", ")
        );
        Ok(CompiledQuery::new(sql, row.into_values().collect()))
    }

    /// Run the INSERT and return the generated id, or `NO_GENERATED_ID` when the backend
    /// generated none.
    ///
    /// # Errors
    /// Returns `ValidationError` before any round trip, or `StatementError` when the backend
    /// rejects the row.
    pub async fn execute(&mut self) -> Result<i64, SqlManagerError> {
        let id = run(&self.manager, self.compile()?).await?;
        self.last_insert_id = id;
        Ok(id)
    }

    /// Id produced by the last `execute` on this builder, `NO_GENERATED_ID` before that.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    /// Submit the INSERT to the background runtime with a snapshot of the staged values.
    ///
    /// Later changes to this builder do not affect the submitted row, and its
    /// `last_insert_id` is not updated.
    pub fn execute_detached(&self, on_complete: Option<CompletionHandler<i64>>) -> Completion<i64> {
        let compiled = self.compile();
        let manager = self.manager.clone();
        self.manager.submit(
            async move { run(&manager, compiled?).await },
            on_complete,
        )
    }
}

async fn run(manager: &DbManager, compiled: CompiledQuery) -> Result<i64, SqlManagerError> {
    let outcome = manager.execute_dml(&compiled.sql, &compiled.params).await?;
    let id = outcome.last_insert_id.unwrap_or(NO_GENERATED_ID);
    debug!(id, rows = outcome.rows_affected, "insert executed");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MysqlOptions, SqliteOptions};
    use crate::schema::TableSchema;
    use crate::types::{LogicalType, RowValues};
    use crate::schema::ColumnDefinition;
    use std::sync::Arc;

    #[test]
    fn compiles_in_staged_order_with_defaults() {
        let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
        let mut schema = TableSchema::new("users");
        for (name, default) in [
            ("username", None),
            ("active", Some(RowValues::Bool(true))),
            ("loginCount", Some(RowValues::Int(0))),
        ] {
            schema.columns.insert(
                name.to_string(),
                ColumnDefinition {
                    name: name.to_string(),
                    logical_type: LogicalType::Integer,
                    constraints: None,
                    default_value: default,
                },
            );
        }
        db.register_schema(Arc::new(schema));

        let compiled = db
            .insert("users")
            .set_boolean("active", false)
            .set_string("username", "johndoe")
            .compile()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO users (active, username, loginCount) VALUES (?, ?, ?)"
        );
        assert_eq!(
            compiled.params,
            vec![
                RowValues::Bool(false),
                RowValues::Text("johndoe".into()),
                RowValues::Int(0),
            ]
        );
    }

    #[test]
    fn empty_insert_is_rejected() {
        let db = DbManager::mysql(MysqlOptions::new("localhost", 3306, "app", "root", None));
        assert!(matches!(
            db.insert("users").compile(),
            Err(SqlManagerError::ValidationError(_))
        ));
        assert!(matches!(
            db.insert("users").set_long("bad col", 1).compile(),
            Err(SqlManagerError::ValidationError(_))
        ));
    }

    #[test]
    fn resetting_a_column_keeps_its_position() {
        let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
        let compiled = db
            .insert("t")
            .set_integer("a", 1)
            .set_integer("b", 2)
            .set_null("a")
            .compile()
            .unwrap();
        assert_eq!(compiled.sql, "INSERT INTO t (a, b) VALUES (?, ?)");
        assert_eq!(compiled.params, vec![RowValues::Null, RowValues::Int(2)]);
        assert_eq!(db.insert("t").last_insert_id(), NO_GENERATED_ID);
    }
}
