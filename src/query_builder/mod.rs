use crate::dialect::{JoinKind, join_clause, validate_identifier};
use crate::error::SqlManagerError;
use crate::manager::DbManager;
use crate::types::RowValues;

mod filter;
mod select;

pub use filter::{CompareOp, Filter, Predicate};

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Fluent SELECT builder for one table.
///
/// Accumulation is synchronous and never touches the connection; `first`, `get` and
/// `count` compile the current state and run it, leaving the builder unchanged.
/// Table, join, filter, grouping and ordering names must be plain identifiers and are
/// checked before any round trip. Selected columns and HAVING conditions are raw SQL.
///
/// ```rust,no_run
/// use sql_manager::prelude::*;
///
/// # async fn demo(db: DbManager) -> Result<(), SqlManagerError> {
/// let active = db
///     .query("users")
///     .where_eq("active", true)
///     .where_greater_than("loginCount", 3)
///     .order_by("username", true)
///     .limit(10)
///     .get()
///     .await?;
/// # let _ = active;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) manager: DbManager,
    pub(crate) table: String,
    pub(crate) columns: Vec<String>,
    pub(crate) filter: Filter,
    pub(crate) joins: Vec<String>,
    pub(crate) group_by: Vec<String>,
    pub(crate) having: Vec<(String, Vec<RowValues>)>,
    pub(crate) order_by: Option<(String, OrderDirection)>,
    pub(crate) limit: Option<(u64, Option<u64>)>,
    errors: Vec<String>,
}

impl QueryBuilder {
    pub(crate) fn new(manager: DbManager, table: &str) -> Self {
        let mut errors = Vec::new();
        if let Err(e) = validate_identifier(table) {
            errors.push(e.to_string());
        }
        Self {
            manager,
            table: table.to_string(),
            columns: Vec::new(),
            filter: Filter::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: None,
            limit: None,
            errors,
        }
    }

    /// Check every identifier the builder will splice into SQL.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ValidationError` listing the malformed names.
    pub fn validate(&self) -> Result<(), SqlManagerError> {
        let mut errors = self.errors.clone();
        if let Err(e) = self.filter.validate() {
            errors.push(e.to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SqlManagerError::ValidationError(errors.join("; ")))
        }
    }

    fn check(&mut self, name: &str) {
        if let Err(e) = validate_identifier(name) {
            self.errors.push(e.to_string());
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns or expressions to select, in place of `*`.
    #[must_use]
    pub fn select_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(ToString::to_string).collect();
        self
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
    pub fn where_between(
        mut self,
        column: &str,
        low: impl Into<RowValues>,
        high: impl Into<RowValues>,
    ) -> Self {
        self.filter = self.filter.where_between(column, low, high);
        self
    }

    #[must_use]
    pub fn where_not_between(
        mut self,
        column: &str,
        low: impl Into<RowValues>,
        high: impl Into<RowValues>,
    ) -> Self {
        self.filter = self.filter.where_not_between(column, low, high);
        self
    }

    /// No-op when `values` is empty.
    #[must_use]
    pub fn where_in(mut self, column: &str, values: Vec<RowValues>) -> Self {
        self.filter = self.filter.where_in(column, values);
        self
    }

    /// No-op when `values` is empty.
    #[must_use]
    pub fn where_not_in(mut self, column: &str, values: Vec<RowValues>) -> Self {
        self.filter = self.filter.where_not_in(column, values);
        self
    }

    #[must_use]
    pub fn where_null(mut self, column: &str) -> Self {
        self.filter = self.filter.where_null(column);
        self
    }

    #[must_use]
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.filter = self.filter.where_not_null(column);
        self
    }

    #[must_use]
    pub fn or_where(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.filter = self.filter.or_where(column, value);
        self
    }

    #[must_use]
    pub fn or_where_like(mut self, column: &str, pattern: &str) -> Self {
        self.filter = self.filter.or_where_like(column, pattern);
        self
    }

    #[must_use]
    pub fn where_group(mut self, build: impl FnOnce(Filter) -> Filter) -> Self {
        self.filter = self.filter.where_group(build);
        self
    }

    #[must_use]
    pub fn or_where_group(mut self, build: impl FnOnce(Filter) -> Filter) -> Self {
        self.filter = self.filter.or_where_group(build);
        self
    }

    /// Replace the accumulated WHERE tree.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Inner, table, left, right)
    }

    #[must_use]
    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Left, table, left, right)
    }

    /// Falls back to a `LEFT JOIN` with swapped columns where `RIGHT JOIN` is unsupported.
    #[must_use]
    pub fn right_join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Right, table, left, right)
    }

    fn push_join(mut self, kind: JoinKind, table: &str, left: &str, right: &str) -> Self {
        // `name`, `name alias` or `name AS alias`
        match table.split_whitespace().collect::<Vec<_>>().as_slice() {
            [name] => self.check(name),
            [name, alias] => {
                self.check(name);
                self.check(alias);
            }
            [name, kw, alias] if kw.eq_ignore_ascii_case("as") => {
                self.check(name);
                self.check(alias);
            }
            _ => self.check(table),
        }
        self.check(left);
        self.check(right);
        let clause = join_clause(self.manager.db_type(), kind, table, left, right);
        self.joins.push(clause);
        self
    }

    /// Last call wins.
    #[must_use]
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.check(column);
        let direction = if ascending {
            OrderDirection::Asc
        } else {
            OrderDirection::Desc
        };
        self.order_by = Some((column.to_string(), direction));
        self
    }

    /// Last call wins, replacing any earlier offset too.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some((limit, None));
        self
    }

    #[must_use]
    pub fn limit_offset(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some((limit, Some(offset)));
        self
    }

    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        for column in columns {
            self.check(column);
        }
        self.group_by = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// Add a HAVING condition; several calls are AND-combined, each parenthesized. Its
    /// parameters bind after the WHERE parameters.
    #[must_use]
    pub fn having(mut self, condition: &str, params: Vec<RowValues>) -> Self {
        self.having.push((condition.to_string(), params));
        self
    }
}
