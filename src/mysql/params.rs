use chrono::{Datelike, Timelike};
use mysql_async::Value;

use crate::error::SqlManagerError;
use crate::types::{ParamConverter, RowValues};

fn date_part<T: TryFrom<i32>>(v: i32, what: &str) -> Result<T, SqlManagerError> {
    T::try_from(v).map_err(|_| SqlManagerError::ParameterError(format!("{what} out of range: {v}")))
}

/// Convert a single `RowValues` to a mysql_async `Value`.
///
/// # Errors
/// Returns `SqlManagerError::ParameterError` for dates outside `MySQL`'s range.
pub fn row_value_to_mysql_value(value: &RowValues) -> Result<Value, SqlManagerError> {
    Ok(match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.clone().into_bytes()),
        RowValues::Bool(b) => Value::Int(i64::from(*b)),
        RowValues::Date(d) => Value::Date(
            date_part(d.year(), "year")?,
            date_part(d.month() as i32, "month")?,
            date_part(d.day() as i32, "day")?,
            0,
            0,
            0,
            0,
        ),
        RowValues::Timestamp(ts) => Value::Date(
            date_part(ts.year(), "year")?,
            date_part(ts.month() as i32, "month")?,
            date_part(ts.day() as i32, "day")?,
            date_part(ts.hour() as i32, "hour")?,
            date_part(ts.minute() as i32, "minute")?,
            date_part(ts.second() as i32, "second")?,
            ts.nanosecond() / 1_000,
        ),
        RowValues::Null => Value::NULL,
    })
}

/// `MySQL` parameter container.
#[derive(Debug, Clone)]
pub struct Params(pub mysql_async::Params);

impl Params {
    /// Convert row values into positional `MySQL` parameters.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ParameterError` if any value cannot be represented.
    pub fn convert(params: &[RowValues]) -> Result<Self, SqlManagerError> {
        if params.is_empty() {
            return Ok(Params(mysql_async::Params::Empty));
        }
        let values = params
            .iter()
            .map(row_value_to_mysql_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Params(mysql_async::Params::Positional(values)))
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

    use super::*;

    #[test]
    fn converts_values() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 6)
            .unwrap();
        assert_eq!(
            row_value_to_mysql_value(&RowValues::Timestamp(ts)).unwrap(),
            Value::Date(2024, 1, 2, 3, 4, 5, 6)
        );
        assert_eq!(
            row_value_to_mysql_value(&RowValues::Bool(true)).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            row_value_to_mysql_value(&RowValues::Text("hi".into())).unwrap(),
            Value::Bytes(b"hi".to_vec())
        );
    }

    #[test]
    fn empty_params_are_empty() {
        assert!(matches!(
            Params::convert(&[]).unwrap().0,
            mysql_async::Params::Empty
        ));
        assert!(matches!(
            Params::convert(&[RowValues::Null]).unwrap().0,
            mysql_async::Params::Positional(ref v) if v.len() == 1
        ));
    }
}
