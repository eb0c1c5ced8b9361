use crate::error::SqlManagerError;
use crate::types::{ParamConverter, RowValues};

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// Dates are stored as `YYYY-MM-DD` text and timestamps as `YYYY-MM-DD HH:MM:SS[.f]`,
/// which is what the result accessors parse back.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> rusqlite::types::Value {
    match value {
        RowValues::Int(i) => rusqlite::types::Value::Integer(*i),
        RowValues::Float(f) => rusqlite::types::Value::Real(*f),
        RowValues::Text(s) => rusqlite::types::Value::Text(s.clone()),
        RowValues::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        RowValues::Date(d) => rusqlite::types::Value::Text(d.format("%Y-%m-%d").to_string()),
        RowValues::Timestamp(dt) => {
            rusqlite::types::Value::Text(dt.format("%F %T%.f").to_string())
        }
        RowValues::Null => rusqlite::types::Value::Null,
    }
}

/// Unified `SQLite` parameter container.
#[derive(Debug, Clone)]
pub struct Params(pub Vec<rusqlite::types::Value>);

impl Params {
    /// Convert row values into `SQLite` values.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches the other backends.
    pub fn convert(params: &[RowValues]) -> Result<Self, SqlManagerError> {
        Ok(Params(params.iter().map(row_value_to_sqlite_value).collect()))
    }

    /// Borrow the underlying values.
    #[must_use]
    pub fn as_values(&self) -> &[rusqlite::types::Value] {
        &self.0
    }
}

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, SqlManagerError> {
        Self::convert(params)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rusqlite::types::Value;

    use super::*;

    #[test]
    fn converts_dates_and_booleans() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let ts = date.and_hms_opt(8, 0, 1).unwrap();
        let params = Params::convert(&[
            RowValues::Bool(true),
            RowValues::Date(date),
            RowValues::Timestamp(ts),
            RowValues::Null,
        ])
        .unwrap();
        assert_eq!(
            params.as_values(),
            &[
                Value::Integer(1),
                Value::Text("2024-03-09".into()),
                Value::Text("2024-03-09 08:00:01".into()),
                Value::Null,
            ]
        );
    }

    #[test]
    fn generic_conversion_matches_direct() {
        let values = [RowValues::Int(7), RowValues::Text("x".into())];
        let generic = crate::conversion::convert_sql_params::<Params>(&values).unwrap();
        assert_eq!(generic.as_values(), Params::convert(&values).unwrap().as_values());
    }
}
