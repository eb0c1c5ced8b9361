use crate::background::{Completion, CompletionHandler};
use crate::error::SqlManagerError;
use crate::executor::CompiledQuery;
use crate::manager::DbManager;
use crate::query_builder::Filter;
use crate::types::RowValues;

use super::{StageValues, StagedValues, validate_columns};

/// Fluent UPDATE. Refuses to run without a filter.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    manager: DbManager,
    table: String,
    values: StagedValues,
    filter: Filter,
}

impl StageValues for UpdateBuilder {
    fn staged_mut(&mut self) -> &mut StagedValues {
        &mut self.values
    }
}

impl UpdateBuilder {
    pub(crate) fn new(manager: DbManager, table: &str) -> Self {
        Self {
            manager,
            table: table.to_string(),
            values: StagedValues::new(),
            filter: Filter::new(),
        }
    }

    #[must_use]
    pub fn where_eq(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.filter = self.filter.where_eq(column, value);
        self
    }

    #[must_use]
    pub fn where_not_eq(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.filter = self.filter.where_not_eq(column, value);
        self
    }

    #[must_use]
    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        self.filter = self.filter.where_like(column, pattern);
        self
    }

    #[must_use]
    pub fn where_greater_than(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.filter = self.filter.where_greater_than(column, value);
        self
    }

    #[must_use]
    pub fn where_less_than(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.filter = self.filter.where_less_than(column, value);
        self
    }

    #[must_use]
    pub fn where_in(mut self, column: &str, values: Vec<RowValues>) -> Self {
        self.filter = self.filter.where_in(column, values);
        self
    }

    #[must_use]
    pub fn where_null(mut self, column: &str) -> Self {
        self.filter = self.filter.where_null(column);
        self
    }

    #[must_use]
    pub fn or_where(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.filter = self.filter.or_where(column, value);
        self
    }

    /// Replace the filter wholesale.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// `UPDATE t SET ... WHERE ...`, staged values binding before filter parameters.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ValidationError` when the filter or the staged values are
    /// empty, or an identifier is malformed.
    pub fn compile(&self) -> Result<CompiledQuery, SqlManagerError> {
        if self.filter.is_empty() {
            return Err(SqlManagerError::ValidationError(format!(
                "update of {} requires a filter",
                self.table
            )));
        }
        if self.values.is_empty() {
            return Err(SqlManagerError::ValidationError(format!(
                "update of {} has no values",
                self.table
            )));
        }
        validate_columns(&self.table, self.values.keys())?;
        self.filter.validate()?;

        let assignments: Vec<String> = self
            .values
            .keys()
            .map(|column| format!("{column} = ?"))
            .collect();
        let mut sql = format!("UPDATE {} SET {} WHERE ", self.table, assignments.join(", "));
        let mut params: Vec<RowValues> = self.values.values().cloned().collect();
        self.filter.render(&mut sql, &mut params);
        Ok(CompiledQuery::new(sql, params))
    }

    /// Run the UPDATE and return rows affected.
    ///
    /// # Errors
    /// Returns `ValidationError` before any round trip, or `StatementError` from the backend.
    pub async fn execute(&self) -> Result<usize, SqlManagerError> {
        let compiled = self.compile()?;
        self.manager
            .execute_update(&compiled.sql, &compiled.params)
            .await
    }

    pub fn execute_detached(
        &self,
        on_complete: Option<CompletionHandler<usize>>,
    ) -> Completion<usize> {
        let builder = self.clone();
        self.manager
            .submit(async move { builder.execute().await }, on_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SqliteOptions;

    #[test]
    fn staged_values_bind_before_filter() {
        let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
        let compiled = db
            .update("users")
            .set_integer("loginCount", 5)
            .set_boolean("active", false)
            .where_eq("username", "johndoe")
            .or_where("username", "jane")
            .compile()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE users SET loginCount = ?, active = ? WHERE username = ? OR username = ?"
        );
        assert_eq!(
            compiled.params,
            vec![
                RowValues::Int(5),
                RowValues::Bool(false),
                RowValues::Text("johndoe".into()),
                RowValues::Text("jane".into()),
            ]
        );
    }

    #[test]
    fn update_without_filter_fails_fast() {
        let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
        let err = db.update("users").set_integer("a", 1).compile().unwrap_err();
        assert!(matches!(err, SqlManagerError::ValidationError(_)));

        // an empty IN list does not count as a filter
        let err = db
            .update("users")
            .set_integer("a", 1)
            .where_in("id", Vec::new())
            .compile()
            .unwrap_err();
        assert!(matches!(err, SqlManagerError::ValidationError(_)));

        let err = db
            .update("users")
            .set_integer("a", 1)
            .where_eq("1=1 OR id", 1)
            .compile()
            .unwrap_err();
        assert!(matches!(err, SqlManagerError::ValidationError(_)));
    }

    #[test]
    fn update_fails_before_touching_the_backend() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let db = DbManager::sqlite(SqliteOptions::new(":memory:"));
            let err = db.update("users").set_integer("a", 1).execute().await.unwrap_err();
            assert!(matches!(err, SqlManagerError::ValidationError(_)));
            assert!(!db.is_connected().await);
        });
    }
}
