//! Parameter conversion utilities.

use crate::error::SqlManagerError;
use crate::types::{ParamConverter, RowValues};

/// Convert a slice of `RowValues` into backend-specific parameters.
///
/// # Errors
///
/// Returns whatever error the converter reports for an individual value.
///
/// # Example
///
/// ```rust,no_run
/// use sql_manager::prelude::*;
/// use sql_manager::sqlite::Params as SqliteParams;
///
/// fn convert(values: &[RowValues]) -> Result<SqliteParams, SqlManagerError> {
///     convert_sql_params::<SqliteParams>(values)
/// }
/// ```
pub fn convert_sql_params<'a, T: ParamConverter<'a>>(
    params: &'a [RowValues],
) -> Result<T::Converted, SqlManagerError> {
    T::convert_sql_params(params)
}
