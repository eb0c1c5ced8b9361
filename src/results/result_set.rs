use std::collections::HashMap;
use std::sync::Arc;

use super::row::CustomDbRow;
use crate::types::RowValues;

/// A result set from a database query
///
/// Rows share one column-name vector and one name-to-index map.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// The number of rows collected (for SELECT) or affected (for DML)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect(),
        ));
        self.column_names = Some(column_names);
    }

    /// Add a row to the result set.
    ///
    /// Ignored until column names have been set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(index)) = (&self.column_names, &self.column_index) {
            self.results.push(CustomDbRow {
                column_names: Arc::clone(column_names),
                rows: row_values,
                column_index_cache: Arc::clone(index),
            });
            self.rows_affected += 1;
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<&CustomDbRow> {
        self.results.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<CustomDbRow> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_names() {
        let mut rs = ResultSet::with_capacity(2);
        rs.add_row_values(vec![RowValues::Int(1)]);
        assert!(rs.is_empty());

        rs.set_column_names(Arc::new(vec!["id".into(), "name".into()]));
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("b".into())]);
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.rows_affected, 2);
        assert_eq!(rs.results[1].get("name"), Some(&RowValues::Text("b".into())));
        assert!(Arc::ptr_eq(
            &rs.results[0].column_names,
            &rs.results[1].column_names
        ));
    }
}
