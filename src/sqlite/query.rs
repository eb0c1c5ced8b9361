use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Statement, params_from_iter};

use crate::error::SqlManagerError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// Blobs come back as lossy UTF-8 text; the value model has no binary variant.
///
/// # Errors
///
/// Returns `SqlManagerError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlManagerError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Text(String::from_utf8_lossy(&b).into_owned()),
    })
}

/// Run a prepared `SQLite` statement and collect every row.
///
/// # Errors
/// Returns `SqlManagerError` if query execution or result processing fails.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Value],
) -> Result<ResultSet, SqlManagerError> {
    let column_names: Arc<Vec<String>> = Arc::new(
        stmt.column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    );
    let width = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(column_names);

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let values = (0..width)
            .map(|idx| sqlite_extract_value_sync(row, idx))
            .collect::<Result<Vec<_>, _>>()?;
        result_set.add_row_values(values);
    }
    Ok(result_set)
}
