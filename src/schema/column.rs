use indexmap::IndexMap;

use crate::dialect::{ddl_type, default_literal};
use crate::types::{DatabaseType, LogicalType, RowValues};

/// A column declared through the schema builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub logical_type: LogicalType,
    /// Raw constraint text appended after the type (e.g. `NOT NULL UNIQUE`).
    pub constraints: Option<String>,
    pub default_value: Option<RowValues>,
}

impl ColumnDefinition {
    /// `name TYPE [DEFAULT literal] [constraints]`
    #[must_use]
    pub fn to_sql(&self, db_type: DatabaseType) -> String {
        let mut sql = format!("{} {}", self.name, ddl_type(db_type, self.logical_type));
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default_literal(default));
        }
        if let Some(constraints) = self.constraints.as_deref().map(str::trim) {
            if !constraints.is_empty() {
                sql.push(' ');
                sql.push_str(constraints);
            }
        }
        sql
    }
}

/// Frozen table layout, registered on the handle once the table is created.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSchema {
    pub name: String,
    /// Declaration order; one entry per column name.
    pub columns: IndexMap<String, ColumnDefinition>,
    /// Verbatim table-level fragments (indexes, foreign keys).
    pub table_constraints: Vec<String>,
}

impl TableSchema {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    /// Columns that declare a default, in declaration order.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.columns.values().filter_map(|col| {
            col.default_value
                .as_ref()
                .map(|value| (col.name.as_str(), value))
        })
    }
}
