use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value as JsonValue};

use crate::types::RowValues;

/// A row from a database query result
///
/// This struct represents a single row from a database query result,
/// with access to both the column names and the values.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: std::sync::Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    // Internal cache for faster column lookups (to avoid repeated string comparisons)
    #[doc(hidden)]
    pub(crate) column_index_cache: std::sync::Arc<std::collections::HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a new database row
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `rows` - The values for this row
    ///
    /// # Returns
    ///
    /// A new `CustomDbRow` instance
    #[must_use]
    pub fn new(column_names: std::sync::Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        // Build a cache of column name to index for faster lookups
        let cache = std::sync::Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<std::collections::HashMap<_, _>>(),
        );

        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name
    ///
    /// # Arguments
    ///
    /// * `column_name` - The name of the column
    ///
    /// # Returns
    ///
    /// The index of the column, or None if not found
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        // First check the cache
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }

        // Fall back to linear search
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    ///
    /// # Arguments
    ///
    /// * `column_name` - The name of the column
    ///
    /// # Returns
    ///
    /// The value at the column, or None if the column wasn't found
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        let index_opt = self.get_column_index(column_name);
        if let Some(idx) = index_opt {
            self.rows.get(idx)
        } else {
            None
        }
    }

    /// Get a value from the row by column index
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the column
    ///
    /// # Returns
    ///
    /// The value at the index, or None if the index is out of bounds
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Whether the row carries a column with this name (even when its value is NULL).
    #[must_use]
    pub fn has(&self, column_name: &str) -> bool {
        self.get_column_index(column_name).is_some()
    }

    /// Column names in the order the backend reported them.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.column_names
    }

    fn non_null(&self, column_name: &str) -> Option<&RowValues> {
        self.get(column_name).filter(|v| !v.is_null())
    }

    /// Text view of a column; numbers and dates are rendered, NULL or missing gives `default`.
    #[must_use]
    pub fn get_string(&self, column_name: &str, default: &str) -> String {
        self.non_null(column_name)
            .map_or_else(|| default.to_string(), ToString::to_string)
    }

    /// Integer view of a column, truncated to `i32`. Out-of-range values fall back to `default`.
    #[must_use]
    pub fn get_int(&self, column_name: &str, default: i32) -> i32 {
        self.non_null(column_name)
            .and_then(RowValues::coerce_i64)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_long(&self, column_name: &str, default: i64) -> i64 {
        self.non_null(column_name)
            .and_then(RowValues::coerce_i64)
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_double(&self, column_name: &str, default: f64) -> f64 {
        self.non_null(column_name)
            .and_then(RowValues::coerce_f64)
            .unwrap_or(default)
    }

    /// Boolean view of a column: integers are true when non-zero, text accepts `true`/`false`/`1`/`0`.
    #[must_use]
    pub fn get_bool(&self, column_name: &str, default: bool) -> bool {
        self.non_null(column_name)
            .and_then(RowValues::coerce_bool)
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_date(&self, column_name: &str) -> Option<NaiveDate> {
        self.non_null(column_name).and_then(RowValues::as_date)
    }

    #[must_use]
    pub fn get_timestamp(&self, column_name: &str) -> Option<NaiveDateTime> {
        self.non_null(column_name).and_then(RowValues::as_timestamp)
    }

    /// Render the row as a JSON object keyed by column name.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.column_names.len());
        for (name, value) in self.column_names.iter().zip(self.rows.iter()) {
            map.insert(
                name.clone(),
                serde_json::to_value(value).unwrap_or(JsonValue::Null),
            );
        }
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::create_test_row;

    fn sample() -> CustomDbRow {
        create_test_row(
            ["id", "username", "active", "money", "created", "note"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            vec![
                RowValues::Int(7),
                RowValues::Text("johndoe".into()),
                RowValues::Int(1),
                RowValues::Text("12.5".into()),
                RowValues::Text("2024-01-01 08:00:01".into()),
                RowValues::Null,
            ],
        )
    }

    #[test]
    fn typed_accessors_coerce() {
        let row = sample();
        assert_eq!(row.get_int("id", -1), 7);
        assert_eq!(row.get_string("id", ""), "7");
        assert_eq!(row.get_string("username", ""), "johndoe");
        assert!(row.get_bool("active", false));
        assert!((row.get_double("money", 0.0) - 12.5).abs() < f64::EPSILON);
        assert_eq!(
            row.get_date("created"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn missing_and_null_fall_back_to_defaults() {
        let row = sample();
        assert!(row.has("note"));
        assert!(!row.has("missing"));
        assert_eq!(row.get_string("note", "n/a"), "n/a");
        assert_eq!(row.get_int("missing", 42), 42);
        assert_eq!(row.get_int("username", 3), 3);
        assert!(row.get_bool("missing", true));
        assert!(row.get_timestamp("note").is_none());
    }

    #[test]
    fn json_rendering() {
        let json = sample().to_json();
        assert_eq!(json["id"], serde_json::json!(7));
        assert_eq!(json["username"], serde_json::json!("johndoe"));
        assert!(json["note"].is_null());
    }
}

