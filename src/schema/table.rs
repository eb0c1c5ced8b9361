use std::sync::Arc;

use tracing::info;

use crate::background::{Completion, CompletionHandler};
use crate::dialect::{primary_key_clause, table_suffix, validate_identifier};
use crate::error::SqlManagerError;
use crate::manager::DbManager;
use crate::types::{DEFAULT_STRING_LENGTH, LogicalType, RowValues};

use super::column::{ColumnDefinition, TableSchema};

/// Fluent `CREATE TABLE` builder.
///
/// Every table gets an auto-increment `id` primary key ahead of the declared columns.
/// Declaring the same column twice keeps its position and takes the later definition.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    manager: DbManager,
    schema: TableSchema,
    errors: Vec<String>,
}

impl TableBuilder {
    pub(crate) fn new(manager: DbManager, name: &str) -> Self {
        let mut errors = Vec::new();
        if let Err(e) = validate_identifier(name) {
            errors.push(e.to_string());
        }
        Self {
            manager,
            schema: TableSchema::new(name),
            errors,
        }
    }

    #[must_use]
    pub fn add_column(
        mut self,
        name: &str,
        logical_type: LogicalType,
        constraints: Option<&str>,
        default_value: Option<RowValues>,
    ) -> Self {
        if let Err(e) = validate_identifier(name) {
            self.errors.push(e.to_string());
            return self;
        }
        if name.eq_ignore_ascii_case("id") {
            self.errors
                .push("column 'id' is generated as the primary key".to_string());
            return self;
        }
        self.schema.columns.insert(
            name.to_string(),
            ColumnDefinition {
                name: name.to_string(),
                logical_type,
                constraints: constraints.map(ToString::to_string),
                default_value,
            },
        );
        self
    }

    /// `VARCHAR(255)`
    #[must_use]
    pub fn add_string(self, name: &str) -> Self {
        self.add_column(name, LogicalType::String(DEFAULT_STRING_LENGTH), None, None)
    }

    #[must_use]
    pub fn add_string_len(self, name: &str, length: u32) -> Self {
        self.add_column(name, LogicalType::String(length), None, None)
    }

    #[must_use]
    pub fn add_integer(self, name: &str) -> Self {
        self.add_column(name, LogicalType::Integer, None, None)
    }

    #[must_use]
    pub fn add_double(self, name: &str) -> Self {
        self.add_column(name, LogicalType::Real, None, None)
    }

    #[must_use]
    pub fn add_boolean(self, name: &str) -> Self {
        self.add_column(name, LogicalType::Boolean, None, None)
    }

    #[must_use]
    pub fn add_text(self, name: &str) -> Self {
        self.add_column(name, LogicalType::Text, None, None)
    }

    #[must_use]
    pub fn add_date(self, name: &str) -> Self {
        self.add_column(name, LogicalType::Date, None, None)
    }

    #[must_use]
    pub fn add_timestamp(self, name: &str) -> Self {
        self.add_column(name, LogicalType::Timestamp, None, None)
    }

    #[must_use]
    pub fn add_string_default(self, name: &str, default: &str) -> Self {
        self.add_column(
            name,
            LogicalType::String(DEFAULT_STRING_LENGTH),
            None,
            Some(RowValues::Text(default.to_string())),
        )
    }

    #[must_use]
    pub fn add_string_len_default(self, name: &str, length: u32, default: &str) -> Self {
        self.add_column(
            name,
            LogicalType::String(length),
            None,
            Some(RowValues::Text(default.to_string())),
        )
    }

    #[must_use]
    pub fn add_integer_default(self, name: &str, default: i64) -> Self {
        self.add_column(name, LogicalType::Integer, None, Some(RowValues::Int(default)))
    }

    #[must_use]
    pub fn add_double_default(self, name: &str, default: f64) -> Self {
        self.add_column(name, LogicalType::Real, None, Some(RowValues::Float(default)))
    }

    #[must_use]
    pub fn add_boolean_default(self, name: &str, default: bool) -> Self {
        self.add_column(name, LogicalType::Boolean, None, Some(RowValues::Bool(default)))
    }

    #[must_use]
    pub fn add_text_default(self, name: &str, default: &str) -> Self {
        self.add_column(
            name,
            LogicalType::Text,
            None,
            Some(RowValues::Text(default.to_string())),
        )
    }

    /// Append a table-level fragment verbatim, e.g. `UNIQUE (email)` or a `FOREIGN KEY`.
    #[must_use]
    pub fn table_constraint(mut self, fragment: &str) -> Self {
        self.schema.table_constraints.push(fragment.to_string());
        self
    }

    /// Like `table_constraint`, with one fragment per dialect.
    #[must_use]
    pub fn dialect_constraint(self, sqlite: &str, mysql: &str) -> Self {
        let fragment = self.manager.dialect_query(sqlite, mysql).to_string();
        self.table_constraint(&fragment)
    }

    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The `CREATE TABLE IF NOT EXISTS` statement for the current declaration.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ValidationError` when a table or column name was rejected.
    pub fn build_ddl(&self) -> Result<String, SqlManagerError> {
        if !self.errors.is_empty() {
            return Err(SqlManagerError::ValidationError(self.errors.join("; ")));
        }
        let db_type = self.manager.db_type();
        let mut parts = vec![primary_key_clause(db_type).to_string()];
        parts.extend(self.schema.columns.values().map(|col| col.to_sql(db_type)));
        parts.extend(self.schema.table_constraints.iter().cloned());
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({}){}",
            self.schema.name,
            parts.join(", "),
            table_suffix(db_type)
        ))
    }

    /// Create the table if it does not exist and register its schema on the handle.
    ///
    /// # Errors
    /// Returns `ValidationError` for rejected names, or `StatementError` with the DDL when the
    /// backend refuses it.
    pub async fn create(&self) -> Result<(), SqlManagerError> {
        let ddl = self.build_ddl()?;
        self.manager.execute_batch(&ddl).await?;
        self.manager.register_schema(Arc::new(self.schema.clone()));
        info!(table = %self.schema.name, columns = self.schema.columns.len(), "table created");
        Ok(())
    }

    /// Drop the table if present, then create it.
    ///
    /// # Errors
    /// Same as `create`.
    pub async fn create_or_replace(&self) -> Result<(), SqlManagerError> {
        let ddl = self.build_ddl()?;
        self.manager
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", self.schema.name))
            .await?;
        self.manager.execute_batch(&ddl).await?;
        self.manager.register_schema(Arc::new(self.schema.clone()));
        info!(table = %self.schema.name, columns = self.schema.columns.len(), "table replaced");
        Ok(())
    }

    pub fn create_detached(&self, on_complete: Option<CompletionHandler<()>>) -> Completion<()> {
        let builder = self.clone();
        self.manager
            .submit(async move { builder.create().await }, on_complete)
    }

    pub fn create_or_replace_detached(
        &self,
        on_complete: Option<CompletionHandler<()>>,
    ) -> Completion<()> {
        let builder = self.clone();
        self.manager
            .submit(async move { builder.create_or_replace().await }, on_complete)
    }
}
