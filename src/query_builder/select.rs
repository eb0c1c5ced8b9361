use crate::background::{Completion, CompletionHandler};
use crate::error::SqlManagerError;
use crate::executor::CompiledQuery;
use crate::results::CustomDbRow;
use crate::types::RowValues;

use super::{OrderDirection, QueryBuilder};

impl QueryBuilder {
    /// Compile the accumulated state into SQL plus parameters.
    ///
    /// A count query keeps only the table, joins and WHERE. A row query appends GROUP BY,
    /// HAVING, ORDER BY and LIMIT in that order, with HAVING parameters after the WHERE ones.
    #[must_use]
    pub fn compile(&self, select_count: bool) -> CompiledQuery {
        self.compile_with_limit(select_count, self.limit)
    }

    fn compile_with_limit(&self, select_count: bool, limit: Option<(u64, Option<u64>)>) -> CompiledQuery {
        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        if select_count {
            sql.push_str("COUNT(*) AS count");
        } else if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.filter.is_empty() {
            sql.push_str(" WHERE ");
            self.filter.render(&mut sql, &mut params);
        }

        if select_count {
            return CompiledQuery::new(sql, params);
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            if let [(condition, _)] = self.having.as_slice() {
                sql.push_str(condition);
            } else {
                let conditions: Vec<String> =
                    self.having.iter().map(|(c, _)| format!("({c})")).collect();
                sql.push_str(&conditions.join(" AND "));
            }
            for (_, having_params) in &self.having {
                params.extend(having_params.iter().cloned());
            }
        }

        if let Some((column, direction)) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(column);
            sql.push_str(match direction {
                OrderDirection::Asc => " ASC",
                OrderDirection::Desc => " DESC",
            });
        }

        if let Some((limit, offset)) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        CompiledQuery::new(sql, params)
    }

    /// SQL text of `compile(select_count)`.
    #[must_use]
    pub fn build_query(&self, select_count: bool) -> String {
        self.compile(select_count).sql
    }

    /// Parameters of the row query, in placeholder order.
    #[must_use]
    pub fn parameters(&self) -> Vec<RowValues> {
        self.compile(false).params
    }

    /// Run the row query.
    ///
    /// # Errors
    /// Returns `ValidationError` for a malformed identifier before any round trip, or
    /// `SqlManagerError` if the connection cannot be established or the backend rejects
    /// the statement.
    pub async fn get(&self) -> Result<Vec<CustomDbRow>, SqlManagerError> {
        self.validate()?;
        let compiled = self.compile(false);
        let rows = self
            .manager
            .query_rows(&compiled.sql, &compiled.params)
            .await?;
        Ok(rows.into_rows())
    }

    /// Run the row query limited to one row. A hit also becomes the handle's current row.
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the connection cannot be established or the backend
    /// rejects the statement.
    pub async fn first(&self) -> Result<Option<CustomDbRow>, SqlManagerError> {
        self.validate()?;
        let offset = self.limit.and_then(|(_, offset)| offset);
        let compiled = self.compile_with_limit(false, Some((1, offset)));
        let rows = self
            .manager
            .query_rows(&compiled.sql, &compiled.params)
            .await?;
        let row = rows.into_rows().into_iter().next();
        if let Some(row) = &row {
            self.manager.set_current_row(row.clone());
        }
        Ok(row)
    }

    /// Count matching rows (ignores ORDER BY, LIMIT, GROUP BY and HAVING).
    ///
    /// # Errors
    /// Returns `SqlManagerError` if the connection cannot be established or the backend
    /// rejects the statement.
    pub async fn count(&self) -> Result<i64, SqlManagerError> {
        self.validate()?;
        let compiled = self.compile(true);
        let rows = self
            .manager
            .query_rows(&compiled.sql, &compiled.params)
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_by_index(0))
            .and_then(RowValues::coerce_i64)
            .unwrap_or(0))
    }

    pub fn get_detached(
        &self,
        on_complete: Option<CompletionHandler<Vec<CustomDbRow>>>,
    ) -> Completion<Vec<CustomDbRow>> {
        let builder = self.clone();
        self.manager
            .submit(async move { builder.get().await }, on_complete)
    }

    pub fn first_detached(
        &self,
        on_complete: Option<CompletionHandler<Option<CustomDbRow>>>,
    ) -> Completion<Option<CustomDbRow>> {
        let builder = self.clone();
        self.manager
            .submit(async move { builder.first().await }, on_complete)
    }

    pub fn count_detached(&self, on_complete: Option<CompletionHandler<i64>>) -> Completion<i64> {
        let builder = self.clone();
        self.manager
            .submit(async move { builder.count().await }, on_complete)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{MysqlOptions, SqliteOptions};
    use crate::error::SqlManagerError;
    use crate::manager::DbManager;
    use crate::types::RowValues;

    fn sqlite() -> DbManager {
        DbManager::sqlite(SqliteOptions::new(":memory:"))
    }

    fn mysql() -> DbManager {
        DbManager::mysql(MysqlOptions::new("localhost", 3306, "app", "root", None))
    }

    #[test]
    fn placeholders_match_parameters() {
        let q = sqlite()
            .query("orders")
            .select_columns(&["customer", "SUM(total) AS spent"])
            .where_eq("status", "paid")
            .or_where("status", "shipped")
            .where_greater_than("total", 10)
            .group_by(&["customer"])
            .having("SUM(total) > ?", vec![RowValues::Int(100)])
            .order_by("spent", false)
            .limit_offset(5, 10);
        let compiled = q.compile(false);
        assert_eq!(
            compiled.sql,
            "SELECT customer, SUM(total) AS spent FROM orders \
             WHERE (status = ? OR status = ?) AND total > ? \
             GROUP BY customer HAVING SUM(total) > ? ORDER BY spent DESC LIMIT 5 OFFSET 10"
        );
        assert_eq!(compiled.placeholder_count(), compiled.params.len());
        assert_eq!(
            compiled.params,
            vec![
                RowValues::Text("paid".into()),
                RowValues::Text("shipped".into()),
                RowValues::Int(10),
                RowValues::Int(100),
            ]
        );
        assert_eq!(q.parameters(), compiled.params);
    }

    #[test]
    fn count_query_drops_trailing_clauses() {
        let q = sqlite()
            .query("orders")
            .where_eq("status", "paid")
            .group_by(&["customer"])
            .having("COUNT(*) > ?", vec![RowValues::Int(1)])
            .order_by("id", true)
            .limit(3);
        let compiled = q.compile(true);
        assert_eq!(
            compiled.sql,
            "SELECT COUNT(*) AS count FROM orders WHERE status = ?"
        );
        assert_eq!(compiled.params, vec![RowValues::Text("paid".into())]);
        assert_eq!(compiled.placeholder_count(), 1);
    }

    #[test]
    fn order_and_limit_last_write_wins() {
        let q = sqlite()
            .query("users")
            .order_by("name", true)
            .order_by("age", false)
            .limit_offset(10, 20)
            .limit(2);
        assert_eq!(
            q.build_query(false),
            "SELECT * FROM users ORDER BY age DESC LIMIT 2"
        );
    }

    #[test]
    fn empty_where_in_changes_nothing() {
        let base = sqlite().query("users").where_eq("active", true);
        let with_empty = base.clone().where_in("id", Vec::new());
        assert_eq!(base.build_query(false), with_empty.build_query(false));
        assert_eq!(base.parameters(), with_empty.parameters());
    }

    #[test]
    fn joins_follow_dialect() {
        let sql = sqlite()
            .query("users")
            .join("profiles", "users.id", "profiles.user_id")
            .right_join("orders", "users.id", "orders.user_id")
            .build_query(false);
        assert_eq!(
            sql,
            "SELECT * FROM users INNER JOIN profiles ON users.id = profiles.user_id \
             LEFT JOIN orders ON orders.user_id = users.id"
        );

        let sql = mysql()
            .query("users")
            .left_join("profiles", "users.id", "profiles.user_id")
            .right_join("orders", "users.id", "orders.user_id")
            .build_query(true);
        assert_eq!(
            sql,
            "SELECT COUNT(*) AS count FROM users LEFT JOIN profiles ON users.id = profiles.user_id \
             RIGHT JOIN orders ON users.id = orders.user_id"
        );
    }

    #[test]
    fn several_having_conditions_keep_their_own_grouping() {
        let q = sqlite()
            .query("t")
            .select_columns(&["c"])
            .group_by(&["c"])
            .having(
                "COUNT(*) > ? OR SUM(n) > ?",
                vec![RowValues::Int(1), RowValues::Int(10)],
            )
            .having("c <> ?", vec![RowValues::Text("a".into())]);
        let compiled = q.compile(false);
        assert_eq!(
            compiled.sql,
            "SELECT c FROM t GROUP BY c HAVING (COUNT(*) > ? OR SUM(n) > ?) AND (c <> ?)"
        );
        assert_eq!(compiled.placeholder_count(), 3);
        assert_eq!(
            compiled.params,
            vec![
                RowValues::Int(1),
                RowValues::Int(10),
                RowValues::Text("a".into())
            ]
        );
    }

    #[test]
    fn malformed_identifiers_are_collected() {
        assert!(
            sqlite()
                .query("users")
                .select_columns(&["COUNT(*) AS n"])
                .join("profiles AS p", "users.id", "p.user_id")
                .left_join("orders o", "users.id", "o.user_id")
                .where_eq("users.active", true)
                .group_by(&["users.id"])
                .order_by("n", false)
                .validate()
                .is_ok()
        );

        let bad = [
            sqlite().query("users; DROP TABLE users"),
            sqlite().query("users").join("p ON 1=1 --", "users.id", "p.id"),
            sqlite().query("users").join("p", "users.id OR 1", "p.id"),
            sqlite().query("users").where_eq("id = 1 OR id", 2),
            sqlite().query("users").group_by(&["a", "b c"]),
            sqlite().query("users").order_by("RANDOM()", true),
        ];
        for q in bad {
            assert!(
                matches!(q.validate(), Err(SqlManagerError::ValidationError(_))),
                "{}",
                q.build_query(false)
            );
        }
    }

    #[test]
    fn invalid_builder_fails_before_connecting() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let db = sqlite();
            let err = db.query("no such").count().await.unwrap_err();
            assert!(matches!(err, SqlManagerError::ValidationError(_)));
            assert!(!db.is_connected().await);
        });
    }

    #[test]
    fn compiling_is_repeatable() {
        let q = mysql().query("t").where_like("name", "a%").limit(1);
        assert_eq!(q.compile(false), q.compile(false));
    }
}
