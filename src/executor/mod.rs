mod dispatch;

pub use dispatch::AsyncDatabaseExecutor;

use crate::types::RowValues;

/// Result of a single DML statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DmlOutcome {
    pub rows_affected: usize,
    /// Key generated by an INSERT, when the backend produced one.
    pub last_insert_id: Option<i64>,
}

/// A SQL string with its positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<RowValues>,
}

impl CompiledQuery {
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<RowValues>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Number of `?` placeholders outside string literals.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        let mut in_literal = false;
        let mut count = 0;
        for ch in self.sql.chars() {
            match ch {
                '\'' => in_literal = !in_literal,
                '?' if !in_literal => count += 1,
                _ => {}
            }
        }
        count
    }
}
