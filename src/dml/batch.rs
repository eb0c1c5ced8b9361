use tracing::info;

use crate::error::SqlManagerError;
use crate::executor::CompiledQuery;
use crate::manager::DbManager;
use crate::types::RowValues;

use super::{StagedValues, validate_columns};

/// Rows per multi-row INSERT.
pub const BATCH_SIZE: usize = 100;

/// Compile `rows` into multi-row INSERTs of at most `chunk` rows.
///
/// Column order comes from the first row; a later row missing one of those columns binds
/// NULL there, and columns only later rows carry are ignored.
pub(crate) fn compile_batch(
    table: &str,
    rows: &[StagedValues],
    chunk: usize,
) -> Result<Vec<CompiledQuery>, SqlManagerError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    if first.is_empty() {
        return Err(SqlManagerError::ValidationError(format!(
            "batch insert into {table} has no columns"
        )));
    }
    validate_columns(table, first.keys())?;
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    let row_placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let head = format!("INSERT INTO {table} ({}) VALUES ", columns.join(", "));

    Ok(rows
        .chunks(chunk.max(1))
        .map(|chunk_rows| {
            let sql = format!(
                "{head}{}",
                vec![row_placeholders.as_str(); chunk_rows.len()].join(", ")
            );
            let params = chunk_rows
                .iter()
                .flat_map(|row| {
                    columns
                        .iter()
                        .map(move |column| row.get(*column).cloned().unwrap_or(RowValues::Null))
                })
                .collect();
            CompiledQuery::new(sql, params)
        })
        .collect())
}

impl DbManager {
    /// Insert many rows in chunks of `BATCH_SIZE`, all inside one transaction.
    ///
    /// Either every row lands or none does; the connection's auto-commit mode afterwards is
    /// what it was before. Returns the number of rows inserted.
    ///
    /// # Errors
    /// Returns `ValidationError` for an empty first row or bad identifiers, or the first
    /// statement failure after rolling back.
    pub async fn insert_batch(
        &self,
        table: &str,
        rows: &[StagedValues],
    ) -> Result<usize, SqlManagerError> {
        let statements = compile_batch(table, rows, BATCH_SIZE)?;
        if statements.is_empty() {
            return Ok(0);
        }
        let chunks = statements.len();
        let inserted = self.run_in_transaction(statements).await?;
        info!(table = %table, rows = inserted, chunks, "batch insert committed");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, RowValues)]) -> StagedValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn chunks_and_fills_missing_with_null() {
        let rows = vec![
            row(&[("a", RowValues::Int(1)), ("b", RowValues::Text("x".into()))]),
            row(&[("b", RowValues::Text("y".into()))]),
            row(&[("a", RowValues::Int(3)), ("c", RowValues::Int(9))]),
        ];
        let stmts = compile_batch("t", &rows, 2).unwrap();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].sql, "INSERT INTO t (a, b) VALUES (?, ?), (?, ?)");
        assert_eq!(
            stmts[0].params,
            vec![
                RowValues::Int(1),
                RowValues::Text("x".into()),
                RowValues::Null,
                RowValues::Text("y".into()),
            ]
        );
        assert_eq!(stmts[1].sql, "INSERT INTO t (a, b) VALUES (?, ?)");
        assert_eq!(stmts[1].params, vec![RowValues::Int(3), RowValues::Null]);
        for stmt in &stmts {
            assert_eq!(stmt.placeholder_count(), stmt.params.len());
        }
    }

    #[test]
    fn empty_batches() {
        assert!(compile_batch("t", &[], BATCH_SIZE).unwrap().is_empty());
        assert!(matches!(
            compile_batch("t", &[StagedValues::new()], BATCH_SIZE),
            Err(SqlManagerError::ValidationError(_))
        ));
    }

    #[test]
    fn default_chunk_size() {
        let rows: Vec<StagedValues> = (0..250)
            .map(|i| row(&[("n", RowValues::Int(i))]))
            .collect();
        let stmts = compile_batch("t", &rows, BATCH_SIZE).unwrap();
        let sizes: Vec<usize> = stmts.iter().map(|s| s.params.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }
}
