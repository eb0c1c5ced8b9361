use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SqlManagerError;

/// Values that can be stored in a database row or used as query parameters.
///
/// The same enum is used by every builder, by both backends and by result rows:
/// ```rust
/// use sql_manager::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Calendar date without time
    Date(NaiveDate),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            RowValues::Timestamp(value) => Some(*value),
            RowValues::Date(date) => date.and_hms_opt(0, 0, 0),
            RowValues::Text(s) => TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s.trim(), fmt).ok()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RowValues::Date(value) => Some(*value),
            RowValues::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| self.as_timestamp().map(|ts| ts.date())),
            RowValues::Timestamp(ts) => Some(ts.date()),
            _ => None,
        }
    }

    /// Best-effort integer view: numbers, booleans and numeric text all convert.
    #[must_use]
    pub fn coerce_i64(&self) -> Option<i64> {
        match self {
            RowValues::Int(i) => Some(*i),
            RowValues::Bool(b) => Some(i64::from(*b)),
            #[allow(clippy::cast_possible_truncation)]
            RowValues::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            RowValues::Text(s) => {
                let trimmed = s.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
            _ => None,
        }
    }

    /// Best-effort floating point view.
    #[must_use]
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            RowValues::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(i) => Some(*i as f64),
            RowValues::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            RowValues::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Best-effort boolean view: `true`/`1` are true, `false`/`0` are false.
    #[must_use]
    pub fn coerce_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(b) => Some(*b),
            RowValues::Int(i) => Some(*i != 0),
            RowValues::Float(f) => Some(*f != 0.0),
            RowValues::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for RowValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValues::Int(i) => write!(f, "{i}"),
            RowValues::Float(v) => write!(f, "{v}"),
            RowValues::Text(s) => f.write_str(s),
            RowValues::Bool(b) => write!(f, "{b}"),
            RowValues::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RowValues::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            RowValues::Null => f.write_str("NULL"),
        }
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<NaiveDate> for RowValues {
    fn from(value: NaiveDate) -> Self {
        RowValues::Date(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// The database type supported by this crate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Embedded, file-backed `SQLite` database
    Sqlite,
    /// Networked `MySQL` server
    Mysql,
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::Sqlite => f.write_str("SQLite"),
            DatabaseType::Mysql => f.write_str("MySQL"),
        }
    }
}

/// Dialect-independent column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// Bounded string, rendered as `VARCHAR(n)`.
    String(u32),
    Integer,
    Real,
    Boolean,
    Text,
    Date,
    Timestamp,
}

/// Length used when a string column is declared without one.
pub const DEFAULT_STRING_LENGTH: u32 = 255;

static VARCHAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:var)?char\s*\(\s*(\d+)\s*\)\s*$").expect("static regex")
});

impl LogicalType {
    /// Map a native column type string back to a logical type.
    ///
    /// Accepts what either dialect reports through introspection
    /// (`VARCHAR(50)`, `int`, `tinyint(1)`, `double`, `datetime`, ...).
    ///
    /// # Errors
    /// Returns `SqlManagerError::ParameterError` for types with no logical counterpart.
    pub fn parse(native: &str) -> Result<Self, SqlManagerError> {
        if let Some(caps) = VARCHAR_RE.captures(native) {
            let len = caps[1].parse::<u32>().map_err(|e| {
                SqlManagerError::ParameterError(format!("invalid length in {native}: {e}"))
            })?;
            return Ok(LogicalType::String(len));
        }
        let lowered = native.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "varchar" | "char" => Ok(LogicalType::String(DEFAULT_STRING_LENGTH)),
            "tinyint(1)" | "boolean" | "bool" => Ok(LogicalType::Boolean),
            "integer" | "int" | "bigint" | "smallint" | "mediumint" | "tinyint" => {
                Ok(LogicalType::Integer)
            }
            "real" | "double" | "float" | "decimal" | "numeric" => Ok(LogicalType::Real),
            "text" | "mediumtext" | "longtext" | "tinytext" => Ok(LogicalType::Text),
            "date" => Ok(LogicalType::Date),
            "timestamp" | "datetime" => Ok(LogicalType::Timestamp),
            other if other.starts_with("int(") || other.starts_with("bigint(") => {
                Ok(LogicalType::Integer)
            }
            other if other.starts_with("double") || other.starts_with("decimal(") => {
                Ok(LogicalType::Real)
            }
            _ => Err(SqlManagerError::ParameterError(format!(
                "no logical type for native type '{native}'"
            ))),
        }
    }
}

/// Convert a slice of `RowValues` into backend-specific parameters.
pub trait ParamConverter<'a> {
    type Converted;

    /// Convert a slice of `RowValues` into the backend's parameter type.
    ///
    /// # Errors
    ///
    /// Returns `SqlManagerError` if the conversion fails for any parameter.
    fn convert_sql_params(params: &'a [RowValues]) -> Result<Self::Converted, SqlManagerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_native_types() {
        assert_eq!(LogicalType::parse("VARCHAR(50)").unwrap(), LogicalType::String(50));
        assert_eq!(LogicalType::parse("varchar( 12 )").unwrap(), LogicalType::String(12));
        assert_eq!(LogicalType::parse("INT").unwrap(), LogicalType::Integer);
        assert_eq!(LogicalType::parse("int(11)").unwrap(), LogicalType::Integer);
        assert_eq!(LogicalType::parse("tinyint(1)").unwrap(), LogicalType::Boolean);
        assert_eq!(LogicalType::parse("BOOLEAN").unwrap(), LogicalType::Boolean);
        assert_eq!(LogicalType::parse("double").unwrap(), LogicalType::Real);
        assert_eq!(LogicalType::parse("datetime").unwrap(), LogicalType::Timestamp);
        assert!(LogicalType::parse("geometry").is_err());
    }

    #[test]
    fn coercions_are_best_effort() {
        assert_eq!(RowValues::Text(" 42 ".into()).coerce_i64(), Some(42));
        assert_eq!(RowValues::Text("4.9".into()).coerce_i64(), Some(4));
        assert_eq!(RowValues::Text("abc".into()).coerce_i64(), None);
        assert_eq!(RowValues::Int(3).coerce_f64(), Some(3.0));
        assert_eq!(RowValues::Text("TRUE".into()).coerce_bool(), Some(true));
        assert_eq!(RowValues::Int(0).coerce_bool(), Some(false));
        assert_eq!(RowValues::Null.coerce_bool(), None);
    }

    #[test]
    fn parses_text_dates_and_timestamps() {
        let ts = RowValues::Text("2024-01-01 08:00:01".into());
        assert_eq!(
            ts.as_timestamp().unwrap(),
            NaiveDateTime::parse_from_str("2024-01-01 08:00:01", "%Y-%m-%d %H:%M:%S").unwrap()
        );
        assert_eq!(
            ts.as_date().unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        let d = RowValues::Text("2023-12-31".into());
        assert_eq!(d.as_date().unwrap(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn option_converts_to_null() {
        let none: Option<i64> = None;
        assert_eq!(RowValues::from(none), RowValues::Null);
        assert_eq!(RowValues::from(Some("x")), RowValues::Text("x".into()));
    }
}
