use std::sync::Arc;

use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::{Row, Value};

use crate::results::ResultSet;
use crate::types::RowValues;

#[allow(clippy::too_many_arguments)]
fn date_value(
    column_type: ColumnType,
    y: u16,
    m: u8,
    d: u8,
    h: u8,
    mi: u8,
    s: u8,
    us: u32,
) -> RowValues {
    let Some(date) = NaiveDate::from_ymd_opt(i32::from(y), u32::from(m), u32::from(d)) else {
        // zero dates ('0000-00-00') have no calendar value
        return RowValues::Null;
    };
    if column_type == ColumnType::MYSQL_TYPE_DATE {
        return RowValues::Date(date);
    }
    date.and_hms_micro_opt(u32::from(h), u32::from(mi), u32::from(s), us)
        .map_or(RowValues::Null, RowValues::Timestamp)
}

/// Convert one `MySQL` value to a `RowValues`.
#[must_use]
pub fn mysql_value_to_row_value(value: Value, column_type: ColumnType) -> RowValues {
    match value {
        Value::NULL => RowValues::Null,
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => RowValues::Text(s),
            Err(e) => RowValues::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        },
        Value::Int(i) => RowValues::Int(i),
        Value::UInt(u) => i64::try_from(u).map_or_else(|_| RowValues::Text(u.to_string()), RowValues::Int),
        Value::Float(f) => RowValues::Float(f64::from(f)),
        Value::Double(d) => RowValues::Float(d),
        Value::Date(y, m, d, h, mi, s, us) => date_value(column_type, y, m, d, h, mi, s, us),
        Value::Time(is_neg, days, hours, minutes, seconds, micro) => {
            let sign = if is_neg { "-" } else { "" };
            RowValues::Text(format!(
                "{sign}{:02}:{minutes:02}:{seconds:02}.{micro:06}",
                days * 24 + u32::from(hours)
            ))
        }
    }
}

/// Build a result set from fetched `MySQL` rows.
///
/// Column names come from the first row; an empty result has no columns.
#[must_use]
pub fn build_result_set(rows: Vec<Row>) -> ResultSet {
    let mut result_set = ResultSet::with_capacity(rows.len());
    let Some(first) = rows.first() else {
        return result_set;
    };
    let columns: Vec<(String, ColumnType)> = first
        .columns_ref()
        .iter()
        .map(|c| (c.name_str().to_string(), c.column_type()))
        .collect();
    result_set.set_column_names(Arc::new(columns.iter().map(|(n, _)| n.clone()).collect()));

    for mut row in rows {
        let mut row_values = Vec::with_capacity(columns.len());
        for (i, (_, column_type)) in columns.iter().enumerate() {
            let value: Value = row.take(i).unwrap_or(Value::NULL);
            row_values.push(mysql_value_to_row_value(value, *column_type));
        }
        result_set.add_row_values(row_values);
    }
    result_set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_follow_column_type() {
        assert_eq!(
            mysql_value_to_row_value(Value::Date(2024, 5, 6, 0, 0, 0, 0), ColumnType::MYSQL_TYPE_DATE),
            RowValues::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
        );
        assert_eq!(
            mysql_value_to_row_value(
                Value::Date(2024, 5, 6, 7, 8, 9, 0),
                ColumnType::MYSQL_TYPE_TIMESTAMP
            ),
            RowValues::Timestamp(
                NaiveDate::from_ymd_opt(2024, 5, 6)
                    .unwrap()
                    .and_hms_opt(7, 8, 9)
                    .unwrap()
            )
        );
        assert_eq!(
            mysql_value_to_row_value(Value::Date(0, 0, 0, 0, 0, 0, 0), ColumnType::MYSQL_TYPE_DATE),
            RowValues::Null
        );
    }

    #[test]
    fn scalars() {
        assert_eq!(
            mysql_value_to_row_value(Value::Bytes(b"abc".to_vec()), ColumnType::MYSQL_TYPE_VAR_STRING),
            RowValues::Text("abc".into())
        );
        assert_eq!(
            mysql_value_to_row_value(Value::UInt(5), ColumnType::MYSQL_TYPE_LONGLONG),
            RowValues::Int(5)
        );
        assert_eq!(
            mysql_value_to_row_value(Value::NULL, ColumnType::MYSQL_TYPE_NULL),
            RowValues::Null
        );
    }
}
